//! HTTP Order Store - Document-store Order Book Reader
//!
//! Fetches the full order book from a document store that exposes the
//! orders collection as a JSON array over HTTP. Wraps reqwest with a
//! timeout and retries with exponential backoff on transient errors
//! (transport failures, 429, 5xx). A body that is not a JSON array
//! fails the fetch; individual documents that do not decode are skipped.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::domain::error::RepositoryError;
use crate::domain::order::OrderRecord;
use crate::ports::repository::OrderRepository;

/// Configuration for the HTTP order store.
#[derive(Debug, Clone)]
pub struct HttpOrderStoreConfig {
    /// Collection URL returning every order.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient errors.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub retry_base_delay: Duration,
}

/// Read-only HTTP order book.
pub struct HttpOrderStore {
    /// Underlying HTTP client.
    http: Client,
    /// Store configuration.
    config: HttpOrderStoreConfig,
}

impl HttpOrderStore {
    /// Create a new store client.
    pub fn new(config: HttpOrderStoreConfig) -> Result<Self, RepositoryError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| RepositoryError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }
}

/// Documents without a usable `id` / `_id` are logged and skipped.
fn decode_records(documents: Vec<Value>) -> Vec<OrderRecord> {
    let total = documents.len();
    let records: Vec<OrderRecord> = documents
        .into_iter()
        .enumerate()
        .filter_map(|(index, document)| match serde_json::from_value(document) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable order document");
                None
            }
        })
        .collect();

    debug!(total, decoded = records.len(), "Fetched order book");
    records
}

#[async_trait]
impl OrderRepository for HttpOrderStore {
    #[instrument(skip(self), fields(url = %self.config.url))]
    async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis(), "Retrying order fetch");
                sleep(delay).await;
            }

            match self.http.get(&self.config.url).send().await {
                Ok(response) => match response.status() {
                    StatusCode::OK => {
                        let documents = response
                            .json::<Vec<Value>>()
                            .await
                            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                        return Ok(decode_records(documents));
                    }
                    status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                        warn!(status = %status, attempt, "Order store unavailable, retrying");
                        let body = response.text().await.unwrap_or_default();
                        last_error = Some(RepositoryError::Status {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    status => {
                        let body = response.text().await.unwrap_or_default();
                        return Err(RepositoryError::Status {
                            status: status.as_u16(),
                            body,
                        });
                    }
                },
                Err(e) => {
                    warn!(error = %e, attempt, "Order fetch failed");
                    last_error = Some(RepositoryError::Unreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RepositoryError::Unreachable("max retries exceeded".into())))
    }

    async fn is_healthy(&self) -> bool {
        self.http
            .head(&self.config.url)
            .send()
            .await
            .is_ok_and(|r| !r.status().is_server_error())
    }
}
