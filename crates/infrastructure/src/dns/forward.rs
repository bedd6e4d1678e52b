use super::upstream::UpstreamResolver;
use async_trait::async_trait;
use hickory_proto::op::{Message, ResponseCode};
use kvdns_application::ports::{DnsHandler, HandlerResult, ResponseWriter};
use kvdns_application::QueryContext;
use std::sync::Arc;
use tracing::debug;

/// Last link of the chain: relays the request to the upstream resolvers and
/// returns their reply unchanged.
pub struct ForwardHandler {
    upstream: Arc<UpstreamResolver>,
}

impl ForwardHandler {
    pub fn new(upstream: Arc<UpstreamResolver>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl DnsHandler for ForwardHandler {
    fn name(&self) -> &'static str {
        "forward"
    }

    async fn serve_dns(
        &self,
        ctx: &QueryContext,
        writer: &dyn ResponseWriter,
        request: &Message,
    ) -> HandlerResult {
        let response = match self.upstream.exchange(ctx, request).await {
            Ok(response) => response,
            Err(e) => return HandlerResult::failed(ResponseCode::ServFail, e),
        };

        let rcode = response.response_code();
        debug!(id = request.id(), rcode = %rcode, "forwarded response");
        match writer.write_msg(response).await {
            Ok(()) => HandlerResult::new(rcode),
            Err(e) => HandlerResult::failed(ResponseCode::ServFail, e),
        }
    }
}
