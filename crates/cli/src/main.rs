use clap::Parser;
use kvdns_domain::CliOverrides;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "kvdns")]
#[command(version)]
#[command(about = "kvdns - DNS server answering from a key-value store")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Zone served from the backend (repeatable)
    #[arg(short = 'z', long = "zone", value_name = "ZONE")]
    zones: Vec<String>,

    /// Backend table holding the records
    #[arg(short = 't', long)]
    table: Option<String>,

    /// HTTP gateway endpoint, selects the http backend
    #[arg(short = 'e', long)]
    endpoint: Option<String>,

    /// Skip TLS certificate verification for the endpoint
    #[arg(long)]
    insecure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Number of listener workers (defaults to available cores)
    #[arg(short = 'w', long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        zones: cli.zones.clone(),
        table: cli.table.clone(),
        endpoint: cli.endpoint.clone(),
        insecure: cli.insecure,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting kvdns v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    let dns_services = di::DnsServices::new(&config, shutdown.clone())?;

    let num_workers = cli.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let listener = server::dns::DnsListenerConfig {
        bind_addr: config.dns_bind_address(),
        num_workers,
        tcp_timeout: Duration::from_secs(config.server.tcp_timeout_secs),
    };

    let mut dns_server = tokio::spawn(server::start_dns_server(
        listener,
        dns_services.handler,
        shutdown.clone(),
    ));

    let finished = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
            shutdown.cancel();
            dns_server.await
        }
        finished = &mut dns_server => finished,
    };

    match finished {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(error = %e, "DNS server error");
            return Err(e);
        }
        Err(e) => {
            error!(error = %e, "DNS server task failed");
            return Err(e.into());
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
