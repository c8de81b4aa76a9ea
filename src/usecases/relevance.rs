//! Relevance Query Use Case - Orders Touching a Wallet's Holdings
//!
//! One query = validate the wallet address, then snapshot its holdings
//! and fetch the order book concurrently, then match. Both data sources
//! run under a single query deadline and a shutdown signal; whichever
//! fires first aborts the in-flight work by dropping it.
//!
//! Workflow:
//! 1. Parse the address (no RPC on failure)
//! 2. Snapshot ∥ fetch orders (repository failure short-circuits)
//! 3. Match and assemble a `RelevanceReport`

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::address::parse_wallet_address;
use crate::domain::error::{ContractQueryFailure, MalformedOrder, RelevanceError};
use crate::domain::matcher::RelevanceMatcher;
use crate::domain::order::RelevantOrder;
use crate::ports::repository::OrderRepository;
use crate::usecases::snapshotter::{BalanceSnapshotter, Snapshot};

/// Outcome of one relevance query.
#[derive(Debug, Clone)]
pub struct RelevanceReport {
  /// Correlates logs and response headers.
  pub query_id: Uuid,
  /// Normalized wallet address.
  pub wallet: Address,
  /// Relevant orders, one per id, sorted by id.
  pub relevant: Vec<RelevantOrder>,
  /// Contracts whose holdings could not be read.
  pub failures: Vec<ContractQueryFailure>,
  /// Order records skipped during matching.
  pub malformed: Vec<MalformedOrder>,
  /// Nonzero holdings used for matching.
  pub holdings_count: usize,
  /// Records returned by the repository.
  pub orders_scanned: usize,
  /// Wall-clock query duration.
  pub elapsed: Duration,
  pub completed_at: DateTime<Utc>,
}

impl RelevanceReport {
  /// Whether the answer may be missing orders for unread contracts.
  pub fn is_partial(&self) -> bool {
    !self.failures.is_empty()
  }
}

/// Answers "which open orders touch this wallet's holdings?".
pub struct RelevanceService {
  snapshotter: BalanceSnapshotter,
  orders: Arc<dyn OrderRepository>,
  matcher: RelevanceMatcher,
  /// Active network (key into the registry).
  network: String,
  /// Deadline for snapshot + fetch.
  deadline: Duration,
}

impl RelevanceService {
  /// Create a new service.
  pub fn new(
    snapshotter: BalanceSnapshotter,
    orders: Arc<dyn OrderRepository>,
    matcher: RelevanceMatcher,
    network: impl Into<String>,
    deadline: Duration,
  ) -> Self {
    Self {
      snapshotter,
      orders,
      matcher,
      network: network.into(),
      deadline,
    }
  }

  pub fn network(&self) -> &str {
    &self.network
  }

  pub fn deadline(&self) -> Duration {
    self.deadline
  }

  /// Chain and order store both reachable.
  pub async fn is_ready(&self) -> bool {
    let (chain, store) = tokio::join!(self.snapshotter.is_healthy(), self.orders.is_healthy());
    chain && store
  }

  /// Orders relevant to `wallet`.
  ///
  /// # Errors
  /// - `InvalidAddress` before any external call
  /// - `RepositoryUnavailable` if the order book cannot be read
  /// - `Timeout` once the query deadline elapses
  /// - `Cancelled` once `cancel` flips to `true`
  #[instrument(skip(self, cancel), fields(network = %self.network))]
  pub async fn related_orders(
    &self,
    wallet: &str,
    cancel: watch::Receiver<bool>,
  ) -> Result<RelevanceReport, RelevanceError> {
    let wallet = parse_wallet_address(wallet)?;
    let query_id = Uuid::new_v4();
    let started = Instant::now();

    let work = async {
      tokio::try_join!(
        async { Ok::<_, RelevanceError>(self.snapshotter.snapshot_address(&self.network, wallet).await) },
        async { self.orders.fetch_all_orders().await.map_err(RelevanceError::from) },
      )
    };

    let (snapshot, records) = match self.bounded(work, cancel).await {
      Ok(gathered) => gathered,
      Err(e) => {
        warn!(%query_id, %wallet, error = %e, "Relevance query aborted");
        return Err(e);
      }
    };

    let orders_scanned = records.len();
    let outcome = self.matcher.match_records(&snapshot.holdings, records);

    let report = RelevanceReport {
      query_id,
      wallet,
      relevant: outcome.relevant,
      failures: snapshot.failures,
      malformed: outcome.malformed,
      holdings_count: snapshot.holdings.len(),
      orders_scanned,
      elapsed: started.elapsed(),
      completed_at: Utc::now(),
    };

    info!(
      %query_id,
      %wallet,
      holdings = report.holdings_count,
      orders = orders_scanned,
      relevant = report.relevant.len(),
      failed_contracts = report.failures.len(),
      malformed = report.malformed.len(),
      elapsed_ms = report.elapsed.as_millis() as u64,
      "Relevance query complete"
    );

    Ok(report)
  }

  /// Holdings of `wallet` on the active network, under the same deadline.
  #[instrument(skip(self, cancel), fields(network = %self.network))]
  pub async fn holdings(
    &self,
    wallet: &str,
    cancel: watch::Receiver<bool>,
  ) -> Result<Snapshot, RelevanceError> {
    let wallet = parse_wallet_address(wallet)?;
    let work = async { Ok(self.snapshotter.snapshot_address(&self.network, wallet).await) };
    self.bounded(work, cancel).await
  }

  /// Run `work` until it completes, the deadline passes, or shutdown begins.
  async fn bounded<T>(
    &self,
    work: impl Future<Output = Result<T, RelevanceError>>,
    mut cancel: watch::Receiver<bool>,
  ) -> Result<T, RelevanceError> {
    let already_cancelled = *cancel.borrow();
    if already_cancelled {
      return Err(RelevanceError::Cancelled);
    }

    tokio::select! {
      biased;
      () = cancelled(&mut cancel) => Err(RelevanceError::Cancelled),
      result = timeout(self.deadline, work) => match result {
        Ok(outcome) => outcome,
        Err(_) => Err(RelevanceError::Timeout(self.deadline)),
      },
    }
  }
}

/// Resolves once the flag is `true`. A dropped sender never cancels.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
  let sender_dropped = cancel.wait_for(|&flag| flag).await.is_err();
  if sender_dropped {
    std::future::pending::<()>().await;
  }
}
