//! Repository Port - Order Book Read Interface
//!
//! The order store is an external collaborator; this service only
//! ever reads the full order set, once per relevance query. Records
//! are returned opaque and decomposed by the domain layer.

use async_trait::async_trait;

use crate::domain::error::RepositoryError;
use crate::domain::order::OrderRecord;

/// Trait for order book read providers.
///
/// The full order set is assumed to fit in memory. No ordering is
/// required of the returned sequence.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
  /// Fetch every persisted order.
  async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, RepositoryError>;

  /// Check if the store is reachable.
  async fn is_healthy(&self) -> bool;
}
