use super::{soa_record, AnswerBuilder};
use crate::ports::{next_or_failure, DnsHandler, HandlerResult, ResponseWriter};
use crate::use_cases::records::ResolveRecordsUseCase;
use crate::QueryContext;
use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use kvdns_domain::{
    to_fqdn, DomainError, Fallthrough, Outcome, QueryDescriptor, RecordType, Zones,
};
use std::sync::Arc;
use tracing::{debug, warn};

const HANDLER_NAME: &str = "kv";

/// Authoritative handler for the configured zones.
///
/// Names outside every zone, and nonexistent names covered by fallthrough,
/// go to the next handler. Everything else is answered here.
pub struct HandleDnsQueryUseCase {
    zones: Zones,
    fallthrough: Fallthrough,
    resolver: Arc<ResolveRecordsUseCase>,
    answers: AnswerBuilder,
    min_ttl: u32,
    next: Option<Arc<dyn DnsHandler>>,
}

impl HandleDnsQueryUseCase {
    pub fn new(
        zones: Zones,
        resolver: Arc<ResolveRecordsUseCase>,
        answers: AnswerBuilder,
        min_ttl: u32,
    ) -> Self {
        Self {
            zones,
            fallthrough: Fallthrough::Disabled,
            resolver,
            answers,
            min_ttl,
            next: None,
        }
    }

    pub fn with_fallthrough(mut self, fallthrough: Fallthrough) -> Self {
        self.fallthrough = fallthrough;
        self
    }

    pub fn with_next(mut self, next: Arc<dyn DnsHandler>) -> Self {
        self.next = Some(next);
        self
    }

    async fn pass_on(
        &self,
        ctx: &QueryContext,
        writer: &dyn ResponseWriter,
        request: &Message,
    ) -> HandlerResult {
        next_or_failure(HANDLER_NAME, self.next.as_ref(), ctx, writer, request).await
    }

    /// Writes a reply carrying only the zone SOA in the authority section.
    async fn write_negative(
        &self,
        writer: &dyn ResponseWriter,
        request: &Message,
        zone: &str,
        rcode: ResponseCode,
        error: Option<DomainError>,
    ) -> HandlerResult {
        let mut response = reply(request);
        response.set_response_code(rcode);
        if let Some(soa) = soa_record(zone, self.min_ttl) {
            response.add_name_server(soa);
        }

        if let Err(e) = writer.write_msg(response).await {
            return HandlerResult::failed(rcode, e);
        }
        match error {
            Some(e) => HandlerResult::failed(rcode, e),
            None => HandlerResult::new(rcode),
        }
    }
}

#[async_trait]
impl DnsHandler for HandleDnsQueryUseCase {
    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    async fn serve_dns(
        &self,
        ctx: &QueryContext,
        writer: &dyn ResponseWriter,
        request: &Message,
    ) -> HandlerResult {
        let Some(question) = request.queries().first() else {
            return HandlerResult::failed(
                ResponseCode::FormErr,
                DomainError::MalformedRequest("request carries no question".to_string()),
            );
        };

        let name = to_fqdn(&question.name().to_ascii());
        let Some(zone) = self.zones.matches(&name) else {
            return self.pass_on(ctx, writer, request).await;
        };

        let query = descriptor(question, &name, zone);
        match self.resolver.execute(ctx, &query).await {
            Outcome::NameError => {
                if self.fallthrough.through(&name) {
                    debug!(name = %name, "name not found, falling through");
                    return self.pass_on(ctx, writer, request).await;
                }
                debug!(name = %name, record_type = %query.record_type, "name not found");
                self.write_negative(writer, request, zone, ResponseCode::NXDomain, None)
                    .await
            }
            Outcome::TransientError(e) => {
                self.write_negative(writer, request, zone, ResponseCode::ServFail, Some(e))
                    .await
            }
            Outcome::Success { records, truncated } => {
                let answers = self.answers.build(ctx, &query, &records).await;

                let mut response = reply(request);
                response
                    .set_response_code(ResponseCode::NoError)
                    .set_truncated(truncated);
                response.add_answers(request.answers().iter().cloned());
                response.add_answers(answers);
                response.add_additionals(request.additionals().iter().cloned());
                if response.answers().is_empty() {
                    if let Some(soa) = soa_record(zone, self.min_ttl) {
                        response.add_name_server(soa);
                    }
                }

                match writer.write_msg(response).await {
                    Ok(()) => HandlerResult::new(ResponseCode::NoError),
                    Err(e) => {
                        warn!(name = %name, error = %e, "failed to write response");
                        HandlerResult::failed(ResponseCode::ServFail, e)
                    }
                }
            }
        }
    }
}

fn descriptor(question: &Query, name: &str, zone: &str) -> QueryDescriptor {
    let record_type = RecordType::from_u16(u16::from(question.query_type()));
    QueryDescriptor::new(name, record_type, zone)
}

/// Response skeleton mirroring the request header and question.
fn reply(request: &Message) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_checking_disabled(request.checking_disabled())
        .set_authoritative(true);
    response.add_queries(request.queries().iter().cloned());
    response
}
