//! Prometheus Metrics Registry - Relevance Query Observability
//!
//! Registers the query, snapshot and matcher metrics and renders them
//! in the text exposition format for the `/metrics` route.

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

use crate::domain::error::{ContractQueryFailure, RelevanceError};
use crate::usecases::relevance::RelevanceReport;

/// Centralized Prometheus metrics for the relevance service.
///
/// All metrics follow the naming convention `relevance_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Queries by outcome (`ok`, `partial`, or the error kind).
    pub queries_total: IntCounterVec,
    /// End-to-end query latency (milliseconds) by endpoint.
    pub query_latency_ms: HistogramVec,
    /// Contracts omitted from a snapshot, by symbol.
    pub contract_failures_total: IntCounterVec,
    /// Relevant orders returned per successful query.
    pub orders_matched: Histogram,
    /// Order records skipped as malformed.
    pub malformed_orders_total: IntCounter,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let queries_total = IntCounterVec::new(
            Opts::new("relevance_queries_total", "Relevance queries by outcome"),
            &["outcome"],
        )?;

        let query_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "relevance_query_latency_ms",
                "Query latency in milliseconds",
            )
            .buckets(vec![
                10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0,
            ]),
            &["endpoint"],
        )?;

        let contract_failures_total = IntCounterVec::new(
            Opts::new(
                "relevance_contract_failures_total",
                "Contracts omitted from snapshots after failed queries",
            ),
            &["symbol"],
        )?;

        let orders_matched = Histogram::with_opts(
            HistogramOpts::new(
                "relevance_orders_matched",
                "Relevant orders returned per query",
            )
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0]),
        )?;

        let malformed_orders_total = IntCounter::new(
            "relevance_malformed_orders_total",
            "Order records skipped as malformed",
        )?;

        // Register all metrics
        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(query_latency_ms.clone()))?;
        registry.register(Box::new(contract_failures_total.clone()))?;
        registry.register(Box::new(orders_matched.clone()))?;
        registry.register(Box::new(malformed_orders_total.clone()))?;

        Ok(Self {
            registry,
            queries_total,
            query_latency_ms,
            contract_failures_total,
            orders_matched,
            malformed_orders_total,
        })
    }

    /// Record a completed relevance query.
    pub fn observe_report(&self, report: &RelevanceReport) {
        let outcome = if report.is_partial() { "partial" } else { "ok" };
        self.queries_total.with_label_values(&[outcome]).inc();
        self.query_latency_ms
            .with_label_values(&["related_orders"])
            .observe(report.elapsed.as_secs_f64() * 1000.0);
        self.orders_matched.observe(report.relevant.len() as f64);
        self.malformed_orders_total.inc_by(report.malformed.len() as u64);
        self.observe_failures(&report.failures);
    }

    /// Record contracts omitted from a snapshot.
    pub fn observe_failures(&self, failures: &[ContractQueryFailure]) {
        for failure in failures {
            self.contract_failures_total
                .with_label_values(&[failure.symbol.as_str()])
                .inc();
        }
    }

    /// Record a query that ended in an error.
    pub fn observe_error(&self, err: &RelevanceError) {
        self.queries_total.with_label_values(&[err.kind()]).inc();
    }

    /// Record latency for an endpoint that does not produce a report.
    pub fn observe_latency(&self, endpoint: &str, elapsed_ms: f64) {
        self.query_latency_ms
            .with_label_values(&[endpoint])
            .observe(elapsed_ms);
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy::primitives::Address;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::token::TokenStandard;

    #[test]
    fn test_render_includes_observed_series() {
        let metrics = MetricsRegistry::new().unwrap();

        let report = RelevanceReport {
            query_id: Uuid::new_v4(),
            wallet: Address::ZERO,
            relevant: Vec::new(),
            failures: vec![ContractQueryFailure {
                contract_address: Address::ZERO,
                symbol: "bayc".into(),
                standard: TokenStandard::NonFungible,
                reason: "timeout".into(),
            }],
            malformed: Vec::new(),
            holdings_count: 0,
            orders_scanned: 0,
            elapsed: Duration::from_millis(42),
            completed_at: Utc::now(),
        };
        metrics.observe_report(&report);
        metrics.observe_error(&RelevanceError::Cancelled);

        let text = metrics.render();
        assert!(text.contains(r#"relevance_queries_total{outcome="partial"} 1"#));
        assert!(text.contains(r#"relevance_queries_total{outcome="cancelled"} 1"#));
        assert!(text.contains(r#"relevance_contract_failures_total{symbol="bayc"} 1"#));
        assert!(text.contains("relevance_query_latency_ms_bucket"));
    }
}
