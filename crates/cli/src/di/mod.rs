use kvdns_application::ports::{DnsHandler, KvStore};
use kvdns_application::use_cases::{
    AnswerBuilder, BackendQueryExecutor, HandleDnsQueryUseCase, ResolveRecordsUseCase,
};
use kvdns_domain::config::BackendKind;
use kvdns_domain::Config;
use kvdns_infrastructure::dns::{DnsServerHandler, ForwardHandler, UpstreamResolver};
use kvdns_infrastructure::kv::{HttpKvStore, MemoryKvStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct DnsServices {
    pub handler: DnsServerHandler,
}

impl DnsServices {
    pub fn new(config: &Config, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let store = Self::build_store(config)?;
        let chain = Self::build_chain(config, store)?;
        let handler = DnsServerHandler::new(chain, config.resolver.query_timeout())
            .with_shutdown(shutdown);

        Ok(Self { handler })
    }

    fn build_store(config: &Config) -> anyhow::Result<Arc<dyn KvStore>> {
        let backend = &config.backend;
        match backend.kind {
            BackendKind::Memory => {
                let store = match &backend.seed_file {
                    Some(path) => MemoryKvStore::from_seed_file(path)?,
                    None => {
                        warn!("Memory backend has no seed file, every query will be NXDOMAIN");
                        MemoryKvStore::new()
                    }
                };
                Ok(Arc::new(store))
            }
            BackendKind::Http => {
                let endpoint = backend
                    .endpoint
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("http backend requires an endpoint"))?;
                info!(
                    endpoint,
                    insecure = backend.insecure,
                    timeout_ms = backend.request_timeout_ms,
                    "Using HTTP backend"
                );
                Ok(Arc::new(HttpKvStore::new(
                    endpoint,
                    backend.insecure,
                    backend.request_timeout(),
                )?))
            }
        }
    }

    fn build_chain(
        config: &Config,
        store: Arc<dyn KvStore>,
    ) -> anyhow::Result<Arc<dyn DnsHandler>> {
        let resolver_config = &config.resolver;
        let zones = resolver_config.zones();

        let executor = BackendQueryExecutor::new(store, config.backend.table.as_str())
            .with_range_limit(config.backend.range_limit());
        let resolver = Arc::new(ResolveRecordsUseCase::new(executor, resolver_config.lookup));

        let mut answers = AnswerBuilder::new(
            Arc::clone(&resolver),
            zones.clone(),
            resolver_config.default_ttl,
        );
        let upstream = parse_servers(&resolver_config.upstream)?;
        if !upstream.is_empty() {
            info!(servers = ?upstream, "CNAME targets outside the zones resolved upstream");
            answers = answers.with_upstream(Arc::new(UpstreamResolver::new(upstream)));
        }

        let mut handler = HandleDnsQueryUseCase::new(
            zones,
            resolver,
            answers,
            resolver_config.min_ttl,
        )
        .with_fallthrough(resolver_config.fallthrough());

        let forward = parse_servers(&resolver_config.forward)?;
        if !forward.is_empty() {
            info!(servers = ?forward, "Unhandled queries forwarded");
            let forwarder = Arc::new(UpstreamResolver::new(forward));
            handler = handler.with_next(Arc::new(ForwardHandler::new(forwarder)));
        }

        info!(
            zones = ?resolver_config.zones,
            table = %config.backend.table,
            lookup = ?resolver_config.lookup,
            "KV handler configured"
        );
        Ok(Arc::new(handler))
    }
}

fn parse_servers(addrs: &[String]) -> anyhow::Result<Vec<SocketAddr>> {
    addrs
        .iter()
        .map(|addr| {
            addr.parse::<SocketAddr>()
                .map_err(|e| anyhow::anyhow!("Invalid resolver address '{}': {}", addr, e))
        })
        .collect()
}
