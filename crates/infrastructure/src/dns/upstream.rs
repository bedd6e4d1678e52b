use super::transport::{DnsTransport, TcpTransport, UdpTransport};
use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use kvdns_application::ports::Upstream;
use kvdns_application::QueryContext;
use kvdns_domain::DomainError;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Recursive resolvers tried in order until one answers.
pub struct UpstreamResolver {
    servers: Vec<SocketAddr>,
}

impl UpstreamResolver {
    pub fn new(servers: Vec<SocketAddr>) -> Self {
        Self { servers }
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// Sends `request` to each server in turn and returns the first decodable
    /// reply carrying the request id. A truncated UDP reply is retried over TCP
    /// against the same server.
    pub async fn exchange(
        &self,
        ctx: &QueryContext,
        request: &Message,
    ) -> Result<Message, DomainError> {
        let bytes = request
            .to_vec()
            .map_err(|e| DomainError::Upstream(format!("Failed to encode query: {}", e)))?;

        let mut last_error = DomainError::Upstream("no upstream servers configured".to_string());
        for server in &self.servers {
            match self.exchange_with(ctx, *server, request.id(), &bytes).await {
                Ok(response) => return Ok(response),
                Err(e @ (DomainError::QueryCancelled | DomainError::QueryTimeout)) => return Err(e),
                Err(e) => {
                    warn!(server = %server, error = %e, "upstream exchange failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn exchange_with(
        &self,
        ctx: &QueryContext,
        server: SocketAddr,
        id: u16,
        bytes: &[u8],
    ) -> Result<Message, DomainError> {
        let udp = UdpTransport::new(server);
        let response = send(ctx, &udp, bytes, id).await?;
        if !response.truncated() {
            return Ok(response);
        }

        debug!(server = %server, "truncated UDP response, retrying over TCP");
        let tcp = TcpTransport::new(server);
        send(ctx, &tcp, bytes, id).await
    }
}

async fn send(
    ctx: &QueryContext,
    transport: &dyn DnsTransport,
    bytes: &[u8],
    id: u16,
) -> Result<Message, DomainError> {
    let timeout = ctx.remaining();
    let response = ctx
        .run(async move { transport.send(bytes, timeout).await })
        .await?;

    let message = Message::from_vec(&response.bytes).map_err(|e| {
        DomainError::Upstream(format!(
            "Malformed {} response: {}",
            response.protocol_used, e
        ))
    })?;
    if message.id() != id {
        return Err(DomainError::Upstream(format!(
            "{} response id {} does not match query id {}",
            response.protocol_used,
            message.id(),
            id
        )));
    }
    Ok(message)
}

/// Builds a recursive query for `name`.
pub fn build_query(name: &Name, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(fastrand::u16(..))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(name.clone(), record_type));
    message
}

#[async_trait]
impl Upstream for UpstreamResolver {
    async fn lookup(
        &self,
        ctx: &QueryContext,
        name: &Name,
        record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let query = build_query(name, record_type);
        self.exchange(ctx, &query).await
    }
}
