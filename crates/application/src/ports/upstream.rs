use crate::QueryContext;
use async_trait::async_trait;
use hickory_proto::op::Message;
use hickory_proto::rr::{Name, RecordType};
use kvdns_domain::DomainError;

/// Resolves names this handler is not authoritative for.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn lookup(
        &self,
        ctx: &QueryContext,
        name: &Name,
        record_type: RecordType,
    ) -> Result<Message, DomainError>;
}
