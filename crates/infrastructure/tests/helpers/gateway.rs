#![allow(dead_code)]
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kvdns_application::ports::{KvStore, RangeRequest, TxnOp, TxnRequest};
use kvdns_domain::KeyRange;
use kvdns_infrastructure::kv::http::{
    WireKeyValue, WireRangeRequest, WireRangeResponse, WireResponseOp, WireTxnRequest,
    WireTxnResponse,
};
use kvdns_infrastructure::kv::MemoryKvStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// In-process JSON gateway serving a [`MemoryKvStore`].
pub struct GatewayStub {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl GatewayStub {
    pub async fn serve(store: MemoryKvStore) -> Self {
        let app = Router::new()
            .route("/v1/kv/range", post(range))
            .route("/v1/kv/txn", post(txn))
            .with_state(Arc::new(store));
        Self::spawn(app).await
    }

    /// Gateway answering every request with `status`.
    pub async fn failing(status: StatusCode) -> Self {
        let app = Router::new()
            .route("/v1/kv/range", post(move || async move { status }))
            .route("/v1/kv/txn", post(move || async move { status }));
        Self::spawn(app).await
    }

    async fn spawn(app: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, handle }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for GatewayStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn decode(value: &str) -> Vec<u8> {
    STANDARD.decode(value).unwrap()
}

fn key_range(wire: &WireRangeRequest) -> KeyRange {
    let key = decode(&wire.key);
    match decode(&wire.range_end) {
        end if end.is_empty() => KeyRange::Exact(key),
        end if end == b"\0" => KeyRange::From(key),
        end => KeyRange::Bounded { start: key, end },
    }
}

fn to_op(wire: &WireRangeRequest) -> TxnOp {
    TxnOp {
        range: key_range(wire),
        limit: (wire.limit > 0).then_some(wire.limit),
        keys_only: wire.keys_only,
    }
}

fn encode(response: kvdns_application::ports::RangeResponse) -> WireRangeResponse {
    WireRangeResponse {
        kvs: response
            .kvs
            .into_iter()
            .map(|kv| WireKeyValue {
                key: STANDARD.encode(kv.key),
                value: STANDARD.encode(kv.value),
            })
            .collect(),
        more: response.more,
    }
}

fn table(wire: &str) -> Arc<str> {
    Arc::from(String::from_utf8(decode(wire)).unwrap())
}

async fn range(
    State(store): State<Arc<MemoryKvStore>>,
    Json(request): Json<WireRangeRequest>,
) -> Json<WireRangeResponse> {
    let op = to_op(&request);
    let result = store
        .range(RangeRequest {
            table: table(&request.table),
            range: op.range,
            limit: op.limit,
            keys_only: op.keys_only,
        })
        .await;
    // Like etcd, an empty range is a successful reply without kvs.
    Json(result.map(encode).unwrap_or_default())
}

async fn txn(
    State(store): State<Arc<MemoryKvStore>>,
    Json(request): Json<WireTxnRequest>,
) -> Result<Json<WireTxnResponse>, StatusCode> {
    let ops = request
        .success
        .iter()
        .map(|op| to_op(&op.request_range))
        .collect();
    let response = store
        .txn(TxnRequest {
            table: table(&request.table),
            ops,
        })
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(WireTxnResponse {
        responses: response
            .responses
            .into_iter()
            .map(|r| WireResponseOp {
                response_range: encode(r),
            })
            .collect(),
    }))
}
