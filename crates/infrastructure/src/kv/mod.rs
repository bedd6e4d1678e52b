pub mod http;
pub mod memory;

pub use http::HttpKvStore;
pub use memory::MemoryKvStore;
