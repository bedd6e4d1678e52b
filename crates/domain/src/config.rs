pub mod backend;
pub mod errors;
pub mod logging;
pub mod resolver;
pub mod root;
pub mod server;

pub use backend::{BackendConfig, BackendKind};
pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use resolver::{LookupMode, ResolverConfig};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
