mod record_type;
mod service;

pub use record_type::RecordType;
pub use service::{HostKind, ServiceRecord};
