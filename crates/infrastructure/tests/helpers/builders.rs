#![allow(dead_code)]
use kvdns_application::ports::{DnsHandler, KvStore};
use kvdns_application::use_cases::{
    AnswerBuilder, BackendQueryExecutor, HandleDnsQueryUseCase, ResolveRecordsUseCase,
};
use kvdns_domain::{LookupMode, Zones};
use kvdns_infrastructure::dns::{ForwardHandler, UpstreamResolver};
use kvdns_infrastructure::kv::MemoryKvStore;
use std::net::SocketAddr;
use std::sync::Arc;

pub const TABLE: &str = "services";

pub fn seeded_store(entries: &[(&str, &str)]) -> MemoryKvStore {
    let store = MemoryKvStore::new();
    for (key, value) in entries {
        store.put(TABLE, *key, *value);
    }
    store
}

/// Handler chain for `example.com.`, optionally followed by a forwarder.
pub struct ChainBuilder {
    store: Arc<dyn KvStore>,
    mode: LookupMode,
    forward: Vec<SocketAddr>,
}

impl ChainBuilder {
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            mode: LookupMode::Typed,
            forward: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: LookupMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn forward_to(mut self, server: SocketAddr) -> Self {
        self.forward.push(server);
        self
    }

    pub fn build(self) -> Arc<dyn DnsHandler> {
        let zones = Zones::new(["example.com"]);
        let executor = BackendQueryExecutor::new(self.store, TABLE);
        let resolver = Arc::new(ResolveRecordsUseCase::new(executor, self.mode));
        let answers = AnswerBuilder::new(Arc::clone(&resolver), zones.clone(), 300);

        let mut handler = HandleDnsQueryUseCase::new(zones, resolver, answers, 30);
        if !self.forward.is_empty() {
            let upstream = Arc::new(UpstreamResolver::new(self.forward));
            handler = handler.with_next(Arc::new(ForwardHandler::new(upstream)));
        }
        Arc::new(handler)
    }
}
