use super::{assemble, BackendQueryExecutor, RawEntries};
use crate::QueryContext;
use kvdns_domain::{DomainError, LookupMode, Outcome, QueryDescriptor, RecordType};
use tracing::debug;

/// Type looked up to check a name exists when the query type is not served directly.
const EXISTENCE_TYPE: RecordType = RecordType::A;

/// Turns a query into an [`Outcome`]: key mapping, backend read, decoding
/// and classification.
pub struct ResolveRecordsUseCase {
    executor: BackendQueryExecutor,
    mode: LookupMode,
}

impl ResolveRecordsUseCase {
    pub fn new(executor: BackendQueryExecutor, mode: LookupMode) -> Self {
        Self { executor, mode }
    }

    pub async fn execute(&self, ctx: &QueryContext, query: &QueryDescriptor) -> Outcome {
        let existence_only = !query.record_type.is_address();
        let lookup_type = if existence_only { EXISTENCE_TYPE } else { query.record_type };

        let entries = match self.fetch(ctx, query, lookup_type).await {
            Ok(entries) => entries,
            Err(e) => return Outcome::from_error(e),
        };

        // An existence lookup only tells whether the name exists; its records are never served.
        if existence_only {
            debug!(name = %query.name, record_type = %query.record_type, "name exists without queried type, answering NODATA");
            return Outcome::Success {
                records: Vec::new(),
                truncated: false,
            };
        }

        match assemble(&entries.kvs) {
            Ok(records) => Outcome::Success {
                records,
                truncated: entries.truncated,
            },
            Err(partial) => {
                debug!(
                    name = %query.name,
                    decoded = partial.partial.len(),
                    "discarding partially decoded answer"
                );
                Outcome::from_error(partial.error)
            }
        }
    }

    async fn fetch(
        &self,
        ctx: &QueryContext,
        query: &QueryDescriptor,
        record_type: RecordType,
    ) -> Result<RawEntries, DomainError> {
        let key = query.key();
        match self.mode {
            LookupMode::Typed => self.executor.typed_lookup(ctx, &key, record_type).await,
            LookupMode::Flat => self.executor.range_lookup(ctx, &key).await,
        }
    }
}
