//! kvdns application layer: ports and use cases
pub mod context;
pub mod ports;
pub mod use_cases;

pub use context::QueryContext;
