#![allow(dead_code)]
#![allow(unused_imports)]

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use kvdns_application::ports::{
    DnsHandler, HandlerResult, KvStore, RangeRequest, RangeResponse, ResponseWriter, TxnOp,
    TxnRequest, TxnResponse, Upstream,
};
use kvdns_application::QueryContext;
use kvdns_domain::{BackendError, DomainError, KeyRange, KeyValue};
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

// ── KvStore ────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct StubKvStore {
    entries: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
    failure: Arc<RwLock<Option<BackendError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    range_calls: Arc<AtomicUsize>,
    txn_calls: Arc<AtomicUsize>,
    last_txn: Arc<Mutex<Option<TxnRequest>>>,
}

impl StubKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (key, value) in entries {
            store.put(key, value);
        }
        store
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap()
            .insert(key.as_bytes().to_vec(), value.as_bytes().to_vec());
    }

    pub fn set_failure(&self, error: BackendError) {
        *self.failure.write().unwrap() = Some(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    pub fn txn_calls(&self) -> usize {
        self.txn_calls.load(Ordering::SeqCst)
    }

    pub fn last_txn(&self) -> Option<TxnRequest> {
        self.last_txn.lock().unwrap().clone()
    }

    async fn before_call(&self) -> Result<(), BackendError> {
        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.read().unwrap().clone();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn read(&self, range: &KeyRange, limit: Option<u64>, keys_only: bool) -> RangeResponse {
        let entries = self.entries.read().unwrap();
        let matched: Vec<KeyValue> = entries
            .iter()
            .filter(|(key, _)| range.contains(key))
            .map(|(key, value)| {
                let value = if keys_only { Vec::new() } else { value.clone() };
                KeyValue::new(key.clone(), value)
            })
            .collect();

        match limit {
            Some(limit) if matched.len() as u64 > limit => RangeResponse {
                kvs: matched.into_iter().take(limit as usize).collect(),
                more: true,
            },
            _ => RangeResponse {
                kvs: matched,
                more: false,
            },
        }
    }
}

#[async_trait]
impl KvStore for StubKvStore {
    async fn range(&self, request: RangeRequest) -> Result<RangeResponse, BackendError> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;

        let response = self.read(&request.range, request.limit, request.keys_only);
        if response.kvs.is_empty() {
            return Err(BackendError::not_found("key not found"));
        }
        Ok(response)
    }

    async fn txn(&self, request: TxnRequest) -> Result<TxnResponse, BackendError> {
        self.txn_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_txn.lock().unwrap() = Some(request.clone());
        self.before_call().await?;

        let responses = request
            .ops
            .iter()
            .map(|op| self.read(&op.range, op.limit, op.keys_only))
            .collect();
        Ok(TxnResponse { responses })
    }
}

// ── ResponseWriter ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingWriter {
    messages: Mutex<Vec<Message>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last(&self) -> Message {
        self.messages
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no response written")
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl ResponseWriter for RecordingWriter {
    async fn write_msg(&self, response: Message) -> Result<(), DomainError> {
        self.messages.lock().unwrap().push(response);
        Ok(())
    }
}

// ── Next handler ───────────────────────────────────────────────────────────

/// Answers every request with NOERROR and counts how often it was reached.
#[derive(Default)]
pub struct MockNextHandler {
    calls: AtomicUsize,
}

impl MockNextHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsHandler for MockNextHandler {
    fn name(&self) -> &'static str {
        "mock-next"
    }

    async fn serve_dns(
        &self,
        _ctx: &QueryContext,
        writer: &dyn ResponseWriter,
        request: &Message,
    ) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_response_code(ResponseCode::NoError);
        response.add_queries(request.queries().iter().cloned());
        match writer.write_msg(response).await {
            Ok(()) => HandlerResult::new(ResponseCode::NoError),
            Err(e) => HandlerResult::failed(ResponseCode::ServFail, e),
        }
    }
}

// ── Upstream ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockUpstream {
    answers: RwLock<HashMap<String, Vec<Ipv4Addr>>>,
    lookups: Mutex<Vec<String>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_answer(&self, name: &str, addresses: Vec<Ipv4Addr>) {
        self.answers
            .write()
            .unwrap()
            .insert(name.to_string(), addresses);
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn lookup(
        &self,
        _ctx: &QueryContext,
        name: &Name,
        _record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let key = name.to_ascii();
        self.lookups.lock().unwrap().push(key.clone());

        let Some(addresses) = self.answers.read().unwrap().get(&key).cloned() else {
            return Err(DomainError::Upstream(format!("no answer for {}", key)));
        };
        let mut response = Message::new();
        response.set_message_type(MessageType::Response);
        for address in addresses {
            response.add_answer(Record::from_rdata(name.clone(), 60, RData::A(A(address))));
        }
        Ok(response)
    }
}

// ── Requests ───────────────────────────────────────────────────────────────

pub fn query_message(name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(4242)
        .set_message_type(MessageType::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(Name::from_ascii(name).unwrap(), record_type));
    message
}

pub fn a_addresses(message: &Message) -> Vec<Ipv4Addr> {
    message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::A(a) => Some(a.0),
            _ => None,
        })
        .collect()
}
