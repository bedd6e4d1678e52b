//! kvdns domain layer
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod kv;
pub mod kv_key;
pub mod outcome;
pub mod zones;

pub use config::{CliOverrides, Config, ConfigError, LookupMode};
pub use dns_query::QueryDescriptor;
pub use dns_record::{HostKind, RecordType, ServiceRecord};
pub use errors::{BackendError, BackendErrorKind, DomainError};
pub use kv::{next_prefix, KeyRange, KeyValue};
pub use kv_key::{normalize_name, KvKey};
pub use outcome::{classify, AnswerSet, FailureClass, Outcome};
pub use zones::{to_fqdn, Fallthrough, Zones};
