use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payment_availability::application::cache::AvailabilityCache;
use payment_availability::application::scheduler::RefreshScheduler;
use payment_availability::config::CacheConfig;
use payment_availability::domain::payment_method::catalog;
use payment_availability::domain::ports::{AvailabilityProbeRef, AvailabilityStoreRef};
use payment_availability::infrastructure::in_memory::InMemoryAvailabilityStore;
use payment_availability::infrastructure::remote::SimulatedRemoteProbe;
use payment_availability::interfaces::http::{self, QueryResponse};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address the read endpoint listens on
    #[arg(long, env = "PAYMENT_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Seconds a refresh keeps the cache fresh
    #[arg(long, env = "PAYMENT_TTL_SECS", default_value_t = 60)]
    ttl_secs: u64,

    /// Seconds between scheduled refreshes
    #[arg(long, env = "PAYMENT_REFRESH_INTERVAL_SECS", default_value_t = 60)]
    refresh_interval_secs: u64,

    /// Seconds in-flight probes get to finish at shutdown
    #[arg(long, env = "PAYMENT_SHUTDOWN_GRACE_SECS", default_value_t = 60)]
    shutdown_grace_secs: u64,

    /// Upper bound on a single probe call, in milliseconds
    #[arg(long, env = "PAYMENT_PROBE_TIMEOUT_MS")]
    probe_timeout_ms: Option<u64>,

    /// Maximum latency of the simulated remote probe, in milliseconds
    #[arg(long, env = "PAYMENT_MAX_PROBE_LATENCY_MS", default_value_t = 1000)]
    max_probe_latency_ms: u64,

    /// Read the cache once, print the response as JSON and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payment_availability=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = catalog();
    let config = CacheConfig::for_catalog(catalog.len())
        .with_ttl(Duration::from_secs(cli.ttl_secs))
        .with_shutdown_grace(Duration::from_secs(cli.shutdown_grace_secs))
        .with_probe_timeout(cli.probe_timeout_ms.map(Duration::from_millis));

    let probe: AvailabilityProbeRef = Arc::new(SimulatedRemoteProbe::new(Duration::from_millis(
        cli.max_probe_latency_ms,
    )));
    let store: AvailabilityStoreRef =
        Arc::new(InMemoryAvailabilityStore::with_capacity(catalog.len()));

    let cache = Arc::new(AvailabilityCache::start(catalog, config, probe, store).into_diagnostic()?);

    if cli.once {
        let response = QueryResponse::from_records(cache.read().await);
        println!("{}", serde_json::to_string(&response).into_diagnostic()?);
        cache.shutdown().await;
        return Ok(());
    }

    let scheduler = RefreshScheduler::spawn(
        cache.clone(),
        Duration::from_secs(cli.refresh_interval_secs),
    )
    .into_diagnostic()?;

    let listener = TcpListener::bind(cli.bind).await.into_diagnostic()?;
    http::serve(listener, cache.clone(), shutdown_signal())
        .await
        .into_diagnostic()?;

    scheduler.stop().await;
    cache.shutdown().await;

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping");
}
