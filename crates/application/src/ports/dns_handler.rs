use crate::QueryContext;
use async_trait::async_trait;
use hickory_proto::op::{Message, ResponseCode};
use kvdns_domain::DomainError;
use std::sync::Arc;

/// What a handler did with a request: the response code it produced and,
/// when something failed, the error to log.
#[derive(Debug)]
pub struct HandlerResult {
    pub rcode: ResponseCode,
    pub error: Option<DomainError>,
}

impl HandlerResult {
    pub fn new(rcode: ResponseCode) -> Self {
        Self { rcode, error: None }
    }

    pub fn failed(rcode: ResponseCode, error: DomainError) -> Self {
        Self {
            rcode,
            error: Some(error),
        }
    }
}

/// Sink for the response to one request.
#[async_trait]
pub trait ResponseWriter: Send + Sync {
    async fn write_msg(&self, response: Message) -> Result<(), DomainError>;
}

/// One link of the request chain.
#[async_trait]
pub trait DnsHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn serve_dns(
        &self,
        ctx: &QueryContext,
        writer: &dyn ResponseWriter,
        request: &Message,
    ) -> HandlerResult;
}

/// Hands the request to `next`, or fails with SERVFAIL when `current` is the
/// last handler of the chain.
pub async fn next_or_failure(
    current: &'static str,
    next: Option<&Arc<dyn DnsHandler>>,
    ctx: &QueryContext,
    writer: &dyn ResponseWriter,
    request: &Message,
) -> HandlerResult {
    match next {
        Some(next) => next.serve_dns(ctx, writer, request).await,
        None => HandlerResult::failed(
            ResponseCode::ServFail,
            DomainError::NoNextHandler(current),
        ),
    }
}
