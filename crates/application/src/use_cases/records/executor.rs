use crate::ports::{KvStore, RangeRequest, RangeResponse, TxnOp, TxnRequest, TxnResponse};
use crate::QueryContext;
use kvdns_domain::{BackendError, DomainError, KeyRange, KeyValue, KvKey, RecordType};
use std::sync::Arc;
use tracing::trace;

/// Raw entries returned for one lookup, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntries {
    pub kvs: Vec<KeyValue>,
    /// The backend stopped at its range limit.
    pub truncated: bool,
}

/// Issues the backend reads for a key. Errors are returned as reported;
/// nothing is retried here.
pub struct BackendQueryExecutor {
    store: Arc<dyn KvStore>,
    table: Arc<str>,
    range_limit: Option<u64>,
}

impl BackendQueryExecutor {
    pub fn new(store: Arc<dyn KvStore>, table: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            table: table.into(),
            range_limit: None,
        }
    }

    pub fn with_range_limit(mut self, range_limit: Option<u64>) -> Self {
        self.range_limit = range_limit;
        self
    }

    /// Everything stored at `key` or below it, read from one snapshot.
    ///
    /// The entry at `key`, its typed records (`key#`) and its descendants
    /// (`key/`) are separate ranges of one transaction, so siblings sharing
    /// the key's bytes (`/com/example/api-a`) are never scanned and never
    /// count against the range limit. The root is a single range.
    pub async fn range_lookup(
        &self,
        ctx: &QueryContext,
        key: &KvKey,
    ) -> Result<RawEntries, DomainError> {
        if key.is_root() {
            return self.root_lookup(ctx, key).await;
        }

        let request = TxnRequest {
            table: Arc::clone(&self.table),
            ops: vec![
                TxnOp::get(key.as_str()),
                TxnOp::prefix(key.records_prefix()).with_limit(self.range_limit),
                TxnOp::prefix(key.children_prefix()).with_limit(self.range_limit),
            ],
        };

        trace!(table = %self.table, key = %key, "range lookup");
        let response = ctx
            .run(async move { self.store.txn(request).await.map_err(DomainError::from) })
            .await?;

        let [own, records, children] = split_responses(response)?;
        let truncated = records.more || children.more;
        let mut kvs = own.kvs;
        kvs.extend(records.kvs);
        kvs.extend(children.kvs);
        if kvs.is_empty() {
            return Err(BackendError::not_found(format!("no entries under {}", key)).into());
        }

        Ok(RawEntries { kvs, truncated })
    }

    async fn root_lookup(&self, ctx: &QueryContext, key: &KvKey) -> Result<RawEntries, DomainError> {
        let request = RangeRequest {
            table: Arc::clone(&self.table),
            range: KeyRange::prefix(key.as_bytes().to_vec()),
            limit: self.range_limit,
            keys_only: false,
        };

        trace!(table = %self.table, key = %key, "root range lookup");
        let response = ctx
            .run(async move { self.store.range(request).await.map_err(DomainError::from) })
            .await?;
        if response.kvs.is_empty() {
            return Err(BackendError::not_found("no entries under the root").into());
        }

        Ok(RawEntries {
            kvs: response.kvs,
            truncated: response.more,
        })
    }

    /// The record of `record_type` at `key` and its typed sub-records, read in
    /// one transaction together with the untyped entry at `key` and two
    /// existence checks for the name.
    ///
    /// Ops: `key#T` (point), `key#T#` (prefix), `key` (point), `key#` (any
    /// type, one key), `key/` (any descendant, one key). Typed records win;
    /// the untyped entry at `key` is served when the name has none of
    /// `record_type`. When all five come back empty the name does not exist
    /// and the backend "not found" status is reported; an existing name
    /// without data of this type yields no entries.
    pub async fn typed_lookup(
        &self,
        ctx: &QueryContext,
        key: &KvKey,
        record_type: RecordType,
    ) -> Result<RawEntries, DomainError> {
        let request = TxnRequest {
            table: Arc::clone(&self.table),
            ops: vec![
                TxnOp::get(key.typed(record_type)),
                TxnOp::prefix(key.typed_prefix(record_type)).with_limit(self.range_limit),
                TxnOp::get(key.as_str()),
                TxnOp::prefix(key.records_prefix()).with_limit(Some(1)).keys_only(),
                TxnOp::prefix(key.children_prefix()).with_limit(Some(1)).keys_only(),
            ],
        };

        trace!(table = %self.table, key = %key, record_type = %record_type, "typed lookup");
        let response = ctx
            .run(async move { self.store.txn(request).await.map_err(DomainError::from) })
            .await?;

        let [point, sub_records, untyped, records, children] = split_responses(response)?;
        let exists = [&point, &sub_records, &untyped, &records, &children]
            .iter()
            .any(|r| !r.kvs.is_empty());
        if !exists {
            return Err(BackendError::not_found(format!("no entries for {}", key)).into());
        }

        if point.kvs.is_empty() && sub_records.kvs.is_empty() {
            return Ok(RawEntries {
                kvs: untyped.kvs,
                truncated: false,
            });
        }

        let truncated = sub_records.more;
        let mut kvs = point.kvs;
        kvs.extend(sub_records.kvs);

        Ok(RawEntries { kvs, truncated })
    }
}

/// One response per op, or an internal error when the backend broke that rule.
fn split_responses<const N: usize>(
    response: TxnResponse,
) -> Result<[RangeResponse; N], DomainError> {
    <[RangeResponse; N]>::try_from(response.responses).map_err(|responses| {
        BackendError::internal(format!(
            "transaction returned {} responses for {} ops",
            responses.len(),
            N
        ))
        .into()
    })
}
