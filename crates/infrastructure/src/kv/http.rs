use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kvdns_application::ports::{
    KvStore, RangeRequest, RangeResponse, TxnOp, TxnRequest, TxnResponse,
};
use kvdns_domain::{BackendError, BackendErrorKind, DomainError, KeyRange, KeyValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const RANGE_PATH: &str = "/v1/kv/range";
const TXN_PATH: &str = "/v1/kv/txn";

/// `range_end` value meaning "every key from `key` on".
const RANGE_END_ALL: &[u8] = b"\0";

// ── wire format ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRangeRequest {
    pub table: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub range_end: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub keys_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireKeyValue {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRangeResponse {
    #[serde(default)]
    pub kvs: Vec<WireKeyValue>,
    #[serde(default)]
    pub more: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRequestOp {
    pub request_range: WireRangeRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTxnRequest {
    pub table: String,
    pub success: Vec<WireRequestOp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireResponseOp {
    #[serde(default)]
    pub response_range: WireRangeResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTxnResponse {
    #[serde(default)]
    pub responses: Vec<WireResponseOp>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl WireRangeRequest {
    fn new(table: &str, range: &KeyRange, limit: Option<u64>, keys_only: bool) -> Self {
        let range_end = match range {
            KeyRange::Exact(_) => String::new(),
            KeyRange::Bounded { end, .. } => STANDARD.encode(end),
            KeyRange::From(_) => STANDARD.encode(RANGE_END_ALL),
        };
        Self {
            table: STANDARD.encode(table),
            key: STANDARD.encode(range.start()),
            range_end,
            limit: limit.unwrap_or(0),
            keys_only,
        }
    }
}

impl WireRangeResponse {
    fn decode(self) -> Result<RangeResponse, BackendError> {
        let kvs = self
            .kvs
            .into_iter()
            .map(|kv| Ok(KeyValue::new(decode_b64(&kv.key)?, decode_b64(&kv.value)?)))
            .collect::<Result<Vec<_>, BackendError>>()?;
        Ok(RangeResponse {
            kvs,
            more: self.more,
        })
    }
}

fn decode_b64(value: &str) -> Result<Vec<u8>, BackendError> {
    STANDARD
        .decode(value)
        .map_err(|e| BackendError::internal(format!("invalid base64 in response: {}", e)))
}

// ── client ─────────────────────────────────────────────────────────────────

/// Key-value backend reached through a JSON gateway over HTTP(S).
pub struct HttpKvStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpKvStore {
    pub fn new(endpoint: &str, insecure: bool, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kvdns/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| DomainError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        if insecure {
            warn!(endpoint = %endpoint, "TLS certificate verification disabled for backend");
        }

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.endpoint, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(url = %url, status = status.as_u16(), "backend request rejected");
            return Err(status_error(status, message));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| BackendError::internal(format!("invalid response from {}: {}", url, e)))
    }
}

/// Maps a non-success HTTP status to the backend status it stands for.
pub fn status_error(status: StatusCode, message: String) -> BackendError {
    let kind = match status {
        StatusCode::NOT_FOUND => BackendErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            BackendErrorKind::DeadlineExceeded
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => BackendErrorKind::Unavailable,
        StatusCode::BAD_REQUEST => BackendErrorKind::InvalidArgument,
        _ => BackendErrorKind::Internal,
    };
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message
    };
    BackendError::new(kind, message)
}

fn request_error(err: reqwest::Error) -> BackendError {
    let kind = if err.is_timeout() {
        BackendErrorKind::DeadlineExceeded
    } else if err.is_connect() {
        BackendErrorKind::Unavailable
    } else {
        BackendErrorKind::Internal
    };
    BackendError::new(kind, err.to_string())
}

#[async_trait]
impl KvStore for HttpKvStore {
    async fn range(&self, request: RangeRequest) -> Result<RangeResponse, BackendError> {
        let body = WireRangeRequest::new(
            &request.table,
            &request.range,
            request.limit,
            request.keys_only,
        );
        let response: WireRangeResponse = self.post(RANGE_PATH, &body).await?;
        let response = response.decode()?;
        if response.kvs.is_empty() {
            return Err(BackendError::not_found("key not found"));
        }
        Ok(response)
    }

    async fn txn(&self, request: TxnRequest) -> Result<TxnResponse, BackendError> {
        let body = WireTxnRequest {
            table: STANDARD.encode(request.table.as_bytes()),
            success: request
                .ops
                .iter()
                .map(|op: &TxnOp| WireRequestOp {
                    request_range: WireRangeRequest::new(
                        &request.table,
                        &op.range,
                        op.limit,
                        op.keys_only,
                    ),
                })
                .collect(),
        };

        let response: WireTxnResponse = self.post(TXN_PATH, &body).await?;
        if response.responses.len() != request.ops.len() {
            return Err(BackendError::internal(format!(
                "transaction returned {} responses for {} ops",
                response.responses.len(),
                request.ops.len()
            )));
        }

        let responses = response
            .responses
            .into_iter()
            .map(|op| op.response_range.decode())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TxnResponse { responses })
    }
}
