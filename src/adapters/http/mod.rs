//! HTTP Adapter - Query, Health and Metrics Endpoints
//!
//! axum 0.7 router exposing:
//! - `GET /relatedOrders/{wallet}` and `GET /relatedOrders?address=`:
//!   relevant orders as a JSON array
//! - `GET /holdings/{wallet}`: the wallet snapshot
//! - `GET /live`, `GET /ready`: orchestrator probes
//! - `GET /metrics`: Prometheus text format
//!
//! Partial snapshots still answer `200`, flagged with the
//! `x-partial-result` and `x-failed-contracts` headers.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, instrument};

pub use error::ApiError;

use crate::adapters::metrics::{HealthState, MetricsRegistry};
use crate::usecases::relevance::RelevanceService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RelevanceService>,
    pub health: HealthState,
    /// `None` when `[metrics] enabled = false`.
    pub metrics: Option<Arc<MetricsRegistry>>,
    /// Flips to `true` when shutdown begins; cancels in-flight queries.
    pub shutdown: watch::Receiver<bool>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/relatedOrders",
            get(handlers::related_orders_by_query).fallback(handlers::unsupported_method),
        )
        .route(
            "/relatedOrders/:address",
            get(handlers::related_orders_by_path).fallback(handlers::unsupported_method),
        )
        .route("/holdings/:address", get(handlers::holdings))
        .route("/live", get(handlers::liveness))
        .route("/ready", get(handlers::readiness))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}

/// Serve `app` until the shutdown flag flips, then drain connections.
#[instrument(skip_all)]
pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let address = listener.local_addr()?;
    info!(address = %address, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|&stopping| stopping).await;
        })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
