//! JSONL Order Store - File-backed Order Book Reader
//!
//! Reads the full order book from a JSON Lines file, one order record
//! per line. The file is re-read on every query so external writers
//! can append orders without coordinating with this service.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::domain::error::RepositoryError;
use crate::domain::order::OrderRecord;
use crate::ports::repository::OrderRepository;

/// Read-only JSONL order book.
///
/// Blank lines are ignored. Lines that are not a JSON object with an
/// `id` (or `_id`) are logged and skipped rather than failing the read.
pub struct JsonlOrderStore {
    /// Path to the JSONL file.
    path: PathBuf,
}

impl JsonlOrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OrderRepository for JsonlOrderStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let content = fs::read_to_string(&self.path).await?;

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<OrderRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        file = %self.path.display(),
                        line = line_no + 1,
                        error = %e,
                        "Skipping undecodable order record"
                    );
                }
            }
        }

        debug!(orders = records.len(), "Loaded order book");
        Ok(records)
    }

    async fn is_healthy(&self) -> bool {
        fs::metadata(&self.path).await.is_ok_and(|m| m.is_file())
    }
}
