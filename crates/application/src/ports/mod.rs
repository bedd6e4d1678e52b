mod dns_handler;
mod kv_store;
mod upstream;

pub use dns_handler::{next_or_failure, DnsHandler, HandlerResult, ResponseWriter};
pub use kv_store::{KvStore, RangeRequest, RangeResponse, TxnOp, TxnRequest, TxnResponse};
pub use upstream::Upstream;
