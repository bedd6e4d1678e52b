pub mod forward;
pub mod server;
pub mod transport;
pub mod upstream;

pub use forward::ForwardHandler;
pub use server::{DnsServerHandler, Protocol};
pub use upstream::UpstreamResolver;
