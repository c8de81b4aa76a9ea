//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics for relevance queries plus the shared health
//! state behind the `/live` and `/ready` probes. Both are served by
//! the HTTP adapter alongside the query routes.

pub mod health;
pub mod prometheus;

pub use health::HealthState;
pub use prometheus::MetricsRegistry;
