//! Order Store Adapters - Read-only Order Book Backends
//!
//! Implements the `OrderRepository` port for the two supported
//! backends and builds the configured one at startup.

pub mod http;
pub mod jsonl;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

pub use http::{HttpOrderStore, HttpOrderStoreConfig};
pub use jsonl::JsonlOrderStore;

use crate::config::OrderStoreConfig;
use crate::ports::repository::OrderRepository;

/// Build the order store selected by `[orders] backend`.
pub fn from_config(config: &OrderStoreConfig) -> Result<Arc<dyn OrderRepository>> {
    let store: Arc<dyn OrderRepository> = match config {
        OrderStoreConfig::File { path } => Arc::new(JsonlOrderStore::new(path)),
        OrderStoreConfig::Http {
            url,
            timeout_ms,
            max_retries,
            retry_base_delay_ms,
        } => Arc::new(HttpOrderStore::new(HttpOrderStoreConfig {
            url: url.clone(),
            timeout: Duration::from_millis(*timeout_ms),
            max_retries: *max_retries,
            retry_base_delay: Duration::from_millis(*retry_base_delay_ms),
        })?),
    };
    Ok(store)
}
