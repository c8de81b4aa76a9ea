//! Balance Snapshotter Use Case - Wallet Holdings Across the Whitelist
//!
//! Queries every whitelisted contract of a network for the wallet's
//! current position and returns one `TokenHolding` per contract with a
//! nonzero balance. Contracts are independent: a failing contract is
//! recorded in `Snapshot::failures` and the rest of the snapshot
//! proceeds.
//!
//! Concurrency is scatter/gather: contracts fan out with a bounded
//! `buffered` stream, token-id enumeration fans out per index, and every
//! RPC call takes a permit from a per-snapshot semaphore so one wallet
//! cannot flood the RPC endpoint.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use futures_util::future::{BoxFuture, FutureExt, try_join_all};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, instrument, warn};

use crate::config::ChainConfig;
use crate::domain::address::parse_wallet_address;
use crate::domain::error::{ChainError, ContractQueryFailure, RelevanceError};
use crate::domain::token::{ContractDescriptor, ContractRegistry, TokenHolding, TokenStandard};
use crate::ports::chain_client::TokenContractReader;

/// Fan-out limits for one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotLimits {
  /// Contracts processed concurrently.
  pub max_concurrent_contracts: usize,
  /// RPC calls in flight (all contracts, all token-id lookups).
  pub max_in_flight_calls: usize,
  /// Largest non-fungible balance that will be enumerated.
  pub max_token_ids_per_contract: u64,
}

impl Default for SnapshotLimits {
  fn default() -> Self {
    Self {
      max_concurrent_contracts: 8,
      max_in_flight_calls: 16,
      max_token_ids_per_contract: 1_000,
    }
  }
}

impl From<&ChainConfig> for SnapshotLimits {
  fn from(config: &ChainConfig) -> Self {
    Self {
      max_concurrent_contracts: config.max_concurrent_contracts.max(1),
      max_in_flight_calls: config.max_in_flight_calls.max(1),
      max_token_ids_per_contract: config.max_token_ids_per_contract,
    }
  }
}

/// Holdings of one wallet, plus the contracts that could not be read.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
  /// Nonzero holdings in registry order.
  pub holdings: Vec<TokenHolding>,
  /// Contracts omitted because their queries failed.
  pub failures: Vec<ContractQueryFailure>,
}

impl Snapshot {
  /// Whether some contracts are missing from `holdings`.
  pub fn is_partial(&self) -> bool {
    !self.failures.is_empty()
  }
}

type ContractOutcome<'a> = (&'a ContractDescriptor, Result<Option<TokenHolding>, ChainError>);

/// Contract-invariant metadata, cached after the first successful read.
#[derive(Debug, Clone, Default)]
struct ContractMetadata {
  symbol: Option<String>,
  decimals: Option<u8>,
}

/// Produces wallet snapshots against the whitelist registry.
pub struct BalanceSnapshotter {
  chain: Arc<dyn TokenContractReader>,
  registry: Arc<ContractRegistry>,
  limits: SnapshotLimits,
  /// `symbol()` / `decimals()` per (network, contract).
  metadata: RwLock<HashMap<(String, Address), ContractMetadata>>,
}

impl BalanceSnapshotter {
  /// Create a new snapshotter.
  pub fn new(
    chain: Arc<dyn TokenContractReader>,
    registry: Arc<ContractRegistry>,
    limits: SnapshotLimits,
  ) -> Self {
    Self {
      chain,
      registry,
      limits,
      metadata: RwLock::new(HashMap::new()),
    }
  }

  pub fn registry(&self) -> &ContractRegistry {
    &self.registry
  }

  /// Check if the chain connection is healthy.
  pub async fn is_healthy(&self) -> bool {
    self.chain.is_healthy().await
  }

  /// Validate `wallet` and snapshot it. No RPC call is made for a bad address.
  pub async fn snapshot(&self, network: &str, wallet: &str) -> Result<Snapshot, RelevanceError> {
    let wallet = parse_wallet_address(wallet)?;
    Ok(self.snapshot_address(network, wallet).await)
  }

  /// Snapshot an already-validated wallet address.
  #[instrument(skip(self), fields(wallet = %wallet))]
  pub async fn snapshot_address(&self, network: &str, wallet: Address) -> Snapshot {
    let contracts = self.registry.lookup(network);
    let permits = Semaphore::new(self.limits.max_in_flight_calls);
    let permits = &permits;

    // Boxed up front so the buffered stream stays `Send` for axum handlers.
    let pending: Vec<BoxFuture<'_, ContractOutcome<'_>>> = contracts
      .iter()
      .map(|descriptor| {
        self
          .snapshot_contract(descriptor, wallet, permits)
          .map(move |result| (descriptor, result))
          .boxed()
      })
      .collect();

    let results: Vec<ContractOutcome<'_>> = stream::iter(pending)
      .buffered(self.limits.max_concurrent_contracts)
      .collect()
      .await;

    let mut snapshot = Snapshot::default();
    for (descriptor, result) in results {
      match result {
        Ok(Some(holding)) => snapshot.holdings.push(holding),
        Ok(None) => {}
        Err(e) => {
          warn!(
            contract = %descriptor.address,
            symbol = %descriptor.symbol,
            error = %e,
            "Contract query failed, omitting from snapshot"
          );
          snapshot.failures.push(ContractQueryFailure {
            contract_address: descriptor.address,
            symbol: descriptor.symbol.clone(),
            standard: descriptor.standard,
            reason: e.to_string(),
          });
        }
      }
    }

    info!(
      network,
      contracts = contracts.len(),
      holdings = snapshot.holdings.len(),
      failures = snapshot.failures.len(),
      "Wallet snapshot complete"
    );

    snapshot
  }

  /// One contract: `balanceOf`, then metadata and ids only if nonzero.
  async fn snapshot_contract(
    &self,
    descriptor: &ContractDescriptor,
    wallet: Address,
    permits: &Semaphore,
  ) -> Result<Option<TokenHolding>, ChainError> {
    let balance = gated(permits, self.chain.balance_of(descriptor.address, wallet)).await?;
    if balance.is_zero() {
      return Ok(None);
    }

    match descriptor.standard {
      TokenStandard::Fungible => {
        let (decimals, symbol) = tokio::try_join!(
          self.cached_decimals(descriptor, permits),
          self.cached_symbol(descriptor, permits),
        )?;
        Ok(TokenHolding::fungible(descriptor.address, symbol, balance, decimals))
      }
      TokenStandard::NonFungible => {
        let (symbol, token_ids) = tokio::try_join!(
          self.cached_symbol(descriptor, permits),
          self.enumerate_token_ids(descriptor, wallet, balance, permits),
        )?;
        Ok(TokenHolding::non_fungible(descriptor.address, symbol, token_ids))
      }
    }
  }

  /// `tokenOfOwnerByIndex` for every index in `[0, balance)`, concurrently.
  async fn enumerate_token_ids(
    &self,
    descriptor: &ContractDescriptor,
    wallet: Address,
    balance: U256,
    permits: &Semaphore,
  ) -> Result<BTreeSet<U256>, ChainError> {
    let limit = self.limits.max_token_ids_per_contract;
    let count = u64::try_from(balance)
      .ok()
      .filter(|&n| n <= limit)
      .ok_or(ChainError::EnumerationLimit { balance, limit })?;

    let ids = try_join_all((0..count).map(|i| {
      gated(
        permits,
        self
          .chain
          .token_of_owner_by_index(descriptor.address, wallet, U256::from(i)),
      )
    }))
    .await?;

    let distinct: BTreeSet<U256> = ids.into_iter().collect();
    if distinct.len() as u64 != count {
      return Err(ChainError::InconsistentEnumeration {
        expected: count,
        distinct: distinct.len(),
      });
    }

    debug!(contract = %descriptor.address, ids = distinct.len(), "Enumerated token ids");
    Ok(distinct)
  }

  async fn cached_symbol(
    &self,
    descriptor: &ContractDescriptor,
    permits: &Semaphore,
  ) -> Result<String, ChainError> {
    let key = (descriptor.network.clone(), descriptor.address);
    {
      let cache = self.metadata.read().await;
      if let Some(symbol) = cache.get(&key).and_then(|m| m.symbol.clone()) {
        return Ok(symbol);
      }
    }

    let symbol = gated(permits, self.chain.symbol(descriptor.address)).await?;

    {
      let mut cache = self.metadata.write().await;
      cache.entry(key).or_default().symbol = Some(symbol.clone());
    }

    Ok(symbol)
  }

  async fn cached_decimals(
    &self,
    descriptor: &ContractDescriptor,
    permits: &Semaphore,
  ) -> Result<u8, ChainError> {
    let key = (descriptor.network.clone(), descriptor.address);
    {
      let cache = self.metadata.read().await;
      if let Some(decimals) = cache.get(&key).and_then(|m| m.decimals) {
        return Ok(decimals);
      }
    }

    let decimals = gated(permits, self.chain.decimals(descriptor.address)).await?;

    {
      let mut cache = self.metadata.write().await;
      cache.entry(key).or_default().decimals = Some(decimals);
    }

    Ok(decimals)
  }
}

/// Hold one in-flight permit for the duration of `call`.
async fn gated<T>(
  permits: &Semaphore,
  call: impl Future<Output = Result<T, ChainError>>,
) -> Result<T, ChainError> {
  let _permit = permits
    .acquire()
    .await
    .map_err(|_| ChainError::PermitsClosed)?;
  call.await
}
