pub mod dns;
pub mod kv;
