mod helpers;

use axum::http::StatusCode;
use helpers::{seeded_store, ChainBuilder, GatewayStub, TABLE};
use hickory_proto::op::{Message, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use kvdns_application::ports::{DnsHandler, KvStore, RangeRequest, TxnOp, TxnRequest};
use kvdns_application::QueryContext;
use kvdns_domain::{BackendErrorKind, KeyRange};
use kvdns_infrastructure::kv::HttpKvStore;
use std::sync::Arc;
use std::time::Duration;

fn client(gateway: &GatewayStub) -> HttpKvStore {
    HttpKvStore::new(&gateway.endpoint(), false, Duration::from_secs(2)).unwrap()
}

fn range_request(range: KeyRange) -> RangeRequest {
    RangeRequest {
        table: Arc::from(TABLE),
        range,
        limit: None,
        keys_only: false,
    }
}

#[tokio::test]
async fn test_range_decodes_keys_and_values() {
    let gateway = GatewayStub::serve(seeded_store(&[
        ("/com/example/api", r#"{"host":"10.0.0.1"}"#),
        ("/com/example/api/x", r#"{"host":"10.0.0.2"}"#),
        ("/com/example/web", r#"{"host":"10.0.0.3"}"#),
    ]))
    .await;
    let store = client(&gateway);

    let response = store
        .range(range_request(KeyRange::prefix("/com/example/api")))
        .await
        .unwrap();

    assert_eq!(response.kvs.len(), 2);
    assert_eq!(response.kvs[0].key, b"/com/example/api");
    assert_eq!(response.kvs[0].value, br#"{"host":"10.0.0.1"}"#);
    assert!(!response.more);
}

#[tokio::test]
async fn test_empty_range_is_not_found() {
    let gateway = GatewayStub::serve(seeded_store(&[("/com/example/api", "{}")])).await;
    let store = client(&gateway);

    let err = store
        .range(range_request(KeyRange::exact("/com/example/nope")))
        .await
        .unwrap_err();

    assert_eq!(err.kind, BackendErrorKind::NotFound);
}

#[tokio::test]
async fn test_txn_returns_one_response_per_op() {
    let gateway = GatewayStub::serve(seeded_store(&[
        ("/com/example/api#A", r#"{"host":"10.0.0.1"}"#),
        ("/com/example/api#A#1", r#"{"host":"10.0.0.2"}"#),
        ("/com/example/api#A#2", r#"{"host":"10.0.0.3"}"#),
    ]))
    .await;
    let store = client(&gateway);

    let response = store
        .txn(TxnRequest {
            table: Arc::from(TABLE),
            ops: vec![
                TxnOp::get("/com/example/api#A"),
                TxnOp::prefix("/com/example/api#A#").with_limit(Some(1)),
                TxnOp::prefix("/com/example/api/").keys_only(),
            ],
        })
        .await
        .unwrap();

    assert_eq!(response.responses.len(), 3);
    assert_eq!(response.responses[0].kvs.len(), 1);
    assert_eq!(response.responses[1].kvs.len(), 1);
    assert!(response.responses[1].more);
    assert!(response.responses[2].kvs.is_empty());
}

#[tokio::test]
async fn test_http_status_maps_to_backend_kind() {
    let cases = [
        (StatusCode::SERVICE_UNAVAILABLE, BackendErrorKind::Unavailable),
        (StatusCode::GATEWAY_TIMEOUT, BackendErrorKind::DeadlineExceeded),
        (StatusCode::NOT_FOUND, BackendErrorKind::NotFound),
        (StatusCode::INTERNAL_SERVER_ERROR, BackendErrorKind::Internal),
    ];

    for (status, kind) in cases {
        let gateway = GatewayStub::failing(status).await;
        let store = client(&gateway);

        let err = store
            .range(range_request(KeyRange::exact("/com/example/api")))
            .await
            .unwrap_err();

        assert_eq!(err.kind, kind, "{status}");
    }
}

#[tokio::test]
async fn test_unreachable_gateway_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let store = HttpKvStore::new(&endpoint, false, Duration::from_secs(2)).unwrap();

    let err = store
        .range(range_request(KeyRange::exact("/com/example/api")))
        .await
        .unwrap_err();

    assert_eq!(err.kind, BackendErrorKind::Unavailable);
}

#[tokio::test]
async fn test_handler_chain_over_http_backend() {
    let gateway = GatewayStub::serve(seeded_store(&[(
        "/com/example/api#A",
        r#"{"host":"10.0.0.1"}"#,
    )]))
    .await;
    let chain = ChainBuilder::new(client(&gateway)).build();
    let writer = RecordingWriter::default();
    let mut request = Message::new();
    request.add_query(Query::query(
        Name::from_ascii("api.example.com.").unwrap(),
        RecordType::A,
    ));

    let result = chain
        .serve_dns(
            &QueryContext::with_timeout(Duration::from_secs(2)),
            &writer,
            &request,
        )
        .await;

    assert_eq!(result.rcode, ResponseCode::NoError);
    let response = writer.0.lock().unwrap().take().unwrap();
    assert_eq!(response.answers().len(), 1);
}

#[derive(Default)]
struct RecordingWriter(std::sync::Mutex<Option<Message>>);

#[async_trait::async_trait]
impl kvdns_application::ports::ResponseWriter for RecordingWriter {
    async fn write_msg(&self, response: Message) -> Result<(), kvdns_domain::DomainError> {
        *self.0.lock().unwrap() = Some(response);
        Ok(())
    }
}
