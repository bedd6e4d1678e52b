use async_trait::async_trait;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, ResponseCode};
use kvdns_application::ports::{DnsHandler, ResponseWriter};
use kvdns_application::QueryContext;
use kvdns_domain::DomainError;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Largest UDP payload offered to EDNS clients.
const MAX_UDP_PAYLOAD: u16 = 4096;
const MIN_UDP_PAYLOAD: u16 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

/// Holds the single response a handler chain produced for one request.
#[derive(Default)]
struct BufferedWriter {
    response: Mutex<Option<Message>>,
}

impl BufferedWriter {
    fn take(&self) -> Option<Message> {
        self.response.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[async_trait]
impl ResponseWriter for BufferedWriter {
    async fn write_msg(&self, response: Message) -> Result<(), DomainError> {
        let mut slot = self
            .response
            .lock()
            .map_err(|_| DomainError::ResponseWrite("response slot poisoned".to_string()))?;
        if slot.is_some() {
            return Err(DomainError::ResponseWrite(
                "response already written".to_string(),
            ));
        }
        *slot = Some(response);
        Ok(())
    }
}

/// Wire-level entry point shared by the UDP and TCP listeners: decodes a
/// request, runs it through the handler chain under a fresh query context
/// and encodes whatever the chain answered.
pub struct DnsServerHandler {
    chain: Arc<dyn DnsHandler>,
    query_timeout: Duration,
    shutdown: CancellationToken,
}

impl DnsServerHandler {
    pub fn new(chain: Arc<dyn DnsHandler>, query_timeout: Duration) -> Self {
        Self {
            chain,
            query_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// In-flight queries are cancelled when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Returns the encoded response, or `None` when nothing should be sent.
    pub async fn handle_raw(
        &self,
        query_buf: &[u8],
        protocol: Protocol,
        client: IpAddr,
    ) -> Option<Vec<u8>> {
        let request = match Message::from_vec(query_buf) {
            Ok(request) => request,
            Err(e) => {
                debug!(client = %client, error = %e, "Failed to decode request");
                return format_error(query_buf);
            }
        };
        if request.message_type() != MessageType::Query {
            return None;
        }

        if let Some(query) = request.queries().first() {
            debug!(
                client = %client,
                name = %query.name(),
                record_type = %query.query_type(),
                ?protocol,
                "DNS query received"
            );
        }

        let ctx = QueryContext::new(
            Instant::now() + self.query_timeout,
            self.shutdown.child_token(),
        );
        let writer = BufferedWriter::default();
        let result = self.chain.serve_dns(&ctx, &writer, &request).await;

        if let Some(e) = &result.error {
            error!(
                handler = self.chain.name(),
                rcode = %result.rcode,
                error = %e,
                "Query failed"
            );
        }

        let mut response = match writer.take() {
            Some(response) => response,
            None if is_client_failure(result.rcode) => {
                let mut response =
                    Message::error_msg(request.id(), request.op_code(), result.rcode);
                response.add_queries(request.queries().iter().cloned());
                response
            }
            None => return None,
        };

        if let Some(edns) = request.extensions() {
            if response.extensions().is_none() {
                let mut reply_edns = Edns::new();
                reply_edns.set_max_payload(edns.max_payload().clamp(MIN_UDP_PAYLOAD, MAX_UDP_PAYLOAD));
                response.set_edns(reply_edns);
            }
        }

        let limit = match protocol {
            Protocol::Udp => Some(udp_payload_limit(&request)),
            Protocol::Tcp => None,
        };
        encode(&mut response, limit)
    }
}

/// Response codes for which the server writes a reply when the chain did not.
fn is_client_failure(rcode: ResponseCode) -> bool {
    matches!(
        rcode,
        ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::FormErr | ResponseCode::NotImp
    )
}

fn udp_payload_limit(request: &Message) -> usize {
    let advertised = request
        .extensions()
        .as_ref()
        .map_or(MIN_UDP_PAYLOAD, |edns| edns.max_payload());
    advertised.clamp(MIN_UDP_PAYLOAD, MAX_UDP_PAYLOAD) as usize
}

/// Encodes `response`; when it exceeds `limit`, drops every record section
/// and sets TC so the client retries over TCP.
fn encode(response: &mut Message, limit: Option<usize>) -> Option<Vec<u8>> {
    let bytes = match response.to_vec() {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to encode response");
            return None;
        }
    };

    match limit {
        Some(limit) if bytes.len() > limit => {
            debug!(size = bytes.len(), limit, "Response truncated for UDP");
            response.take_answers();
            response.take_name_servers();
            response.take_additionals();
            response.set_truncated(true);
            response
                .to_vec()
                .map_err(|e| warn!(error = %e, "Failed to encode truncated response"))
                .ok()
        }
        _ => Some(bytes),
    }
}

/// FORMERR for a request whose header could be read but whose body could not.
fn format_error(query_buf: &[u8]) -> Option<Vec<u8>> {
    if query_buf.len() < 12 {
        return None;
    }
    // QR set means this is a response; never answer those.
    if query_buf[2] & 0x80 != 0 {
        return None;
    }
    let id = u16::from_be_bytes([query_buf[0], query_buf[1]]);
    Message::error_msg(id, OpCode::Query, ResponseCode::FormErr)
        .to_vec()
        .ok()
}
