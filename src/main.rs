//! Seaport Relevance — Entry Point
//!
//! Initializes configuration, logging, the chain connection and the
//! order store, then serves relevance queries until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config (first CLI argument, `CONFIG_PATH`, or config.toml)
//! 2. Init tracing (JSON structured logging)
//! 3. Build the contract registry from the whitelist
//! 4. Connect the chain provider (chain id check)
//! 5. Build the order store (file or HTTP backend)
//! 6. Build the snapshotter + relevance service
//! 7. Serve HTTP (query + /live + /ready + /metrics)
//! 8. Wait for SIGINT → readiness 503, cancel in-flight queries, drain

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use seaport_relevance::adapters::chain::{CallPolicy, ChainProvider, TokenContracts};
use seaport_relevance::adapters::http::{self, AppState};
use seaport_relevance::adapters::metrics::{HealthState, MetricsRegistry};
use seaport_relevance::adapters::orders;
use seaport_relevance::config;
use seaport_relevance::domain::matcher::RelevanceMatcher;
use seaport_relevance::domain::token::ContractRegistry;
use seaport_relevance::ports::chain_client::TokenContractReader;
use seaport_relevance::usecases::{BalanceSnapshotter, RelevanceService, SnapshotLimits};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.service.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        network = %config.service.network,
        policy = ?config.query.policy,
        "Starting Seaport relevance service"
    );

    // ── 3. Contract registry ────────────────────────────────
    let registry = Arc::new(
        ContractRegistry::from_entries(config.whitelist_entries())
            .context("Invalid contract whitelist")?,
    );
    info!(
        contracts = registry.lookup(&config.service.network).len(),
        networks = ?registry.networks(),
        "Contract registry loaded"
    );

    // ── 4. Chain provider + contract reader ─────────────────
    let rpc_url = config::loader::resolve_rpc_url(&config.chain, &config.service.network)?;
    let provider = ChainProvider::connect(&rpc_url, config.chain.expected_chain_id)
        .await
        .context("Failed to connect to chain RPC")?;
    let chain: Arc<dyn TokenContractReader> = Arc::new(TokenContracts::new(
        provider.inner(),
        CallPolicy::from(&config.chain),
    ));

    // ── 5. Order store ──────────────────────────────────────
    let order_store = orders::from_config(&config.orders).context("Failed to build order store")?;

    // ── 6. Relevance service ────────────────────────────────
    let snapshotter = BalanceSnapshotter::new(
        chain,
        Arc::clone(&registry),
        SnapshotLimits::from(&config.chain),
    );
    let service = Arc::new(RelevanceService::new(
        snapshotter,
        order_store,
        RelevanceMatcher::new(config.query.policy),
        config.service.network.clone(),
        Duration::from_millis(config.query.timeout_ms),
    ));

    let metrics = if config.metrics.enabled {
        Some(Arc::new(MetricsRegistry::new().context("Failed to register metrics")?))
    } else {
        None
    };

    // ── 7. Shutdown channel + HTTP server ───────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let health = HealthState::new();

    let app = http::router(AppState {
        service,
        health: health.clone(),
        metrics,
        shutdown: shutdown_rx.clone(),
    });

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;

    let server_handle = tokio::spawn(async move {
        if let Err(e) = http::serve(listener, app, shutdown_rx).await {
            error!(error = %e, "HTTP server failed");
        }
    });

    info!("Service is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    // Readiness probe → 503, then cancel in-flight queries and drain.
    health.begin_shutdown();
    let _ = shutdown_tx.send(true);

    if tokio::time::timeout(Duration::from_secs(30), server_handle)
        .await
        .is_err()
    {
        warn!("HTTP server did not drain within 30s");
    }

    info!("Shutdown complete");
    Ok(())
}
