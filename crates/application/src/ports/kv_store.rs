use async_trait::async_trait;
use kvdns_domain::{BackendError, KeyRange, KeyValue};
use std::sync::Arc;

/// A single read inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxnOp {
    pub range: KeyRange,
    pub limit: Option<u64>,
    pub keys_only: bool,
}

impl TxnOp {
    pub fn get(key: impl Into<Vec<u8>>) -> Self {
        Self {
            range: KeyRange::exact(key),
            limit: None,
            keys_only: false,
        }
    }

    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            range: KeyRange::prefix(prefix),
            limit: None,
            keys_only: false,
        }
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    pub table: Arc<str>,
    pub range: KeyRange,
    pub limit: Option<u64>,
    pub keys_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeResponse {
    pub kvs: Vec<KeyValue>,
    /// More keys matched than `limit` allowed.
    pub more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxnRequest {
    pub table: Arc<str>,
    pub ops: Vec<TxnOp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxnResponse {
    /// One response per op, in request order.
    pub responses: Vec<RangeResponse>,
}

/// Read access to a table-scoped key-value backend.
///
/// Implementations must be safe to share between concurrent queries.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads one range. A range matching no key reports `NotFound`.
    async fn range(&self, request: RangeRequest) -> Result<RangeResponse, BackendError>;

    /// Evaluates every op against the same snapshot. Ops matching nothing
    /// yield empty responses, not errors.
    async fn txn(&self, request: TxnRequest) -> Result<TxnResponse, BackendError>;
}
