//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! The network selector, RPC endpoint and contract whitelist are all
//! externalized here - nothing is hardcoded in the domain layer. The
//! RPC credential never lives in the file; it is read from the
//! environment variable named by `chain.api_key_env`.

pub mod loader;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::matcher::RelevancePolicy;
use crate::domain::token::{TokenStandard, WhitelistEntry};

/// Top-level service configuration.
///
/// Loaded once at startup and shared immutably afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and network selection.
  pub service: ServiceConfig,
  /// Chain RPC access and fan-out limits.
  pub chain: ChainConfig,
  /// Per-query behaviour.
  #[serde(default)]
  pub query: QueryConfig,
  /// HTTP listener.
  #[serde(default)]
  pub server: ServerConfig,
  /// Metrics export.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Order store backend.
  pub orders: OrderStoreConfig,
  /// Whitelisted contracts per network.
  #[serde(default)]
  pub whitelist: BTreeMap<String, NetworkWhitelist>,
}

impl AppConfig {
  /// Flatten the whitelist tables into registry entries.
  pub fn whitelist_entries(&self) -> Vec<WhitelistEntry> {
    let mut entries = Vec::new();
    for (network, lists) in &self.whitelist {
      for (standard, list) in [
        (TokenStandard::Fungible, &lists.erc20),
        (TokenStandard::NonFungible, &lists.erc721),
      ] {
        for (symbol, address) in list {
          entries.push(WhitelistEntry {
            network: network.clone(),
            standard,
            symbol: symbol.clone(),
            address: address.clone(),
          });
        }
      }
    }
    entries
  }
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Active network (key into `whitelist`), e.g. `mainnet`.
  pub network: String,
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// RPC endpoint. `{network}` and `{api_key}` placeholders are expanded.
  pub rpc_url: String,
  /// Environment variable holding the RPC credential.
  pub api_key_env: Option<String>,
  /// Expected chain id, checked once at startup.
  pub expected_chain_id: Option<u64>,
  /// Per-call timeout (milliseconds).
  #[serde(default = "default_call_timeout")]
  pub call_timeout_ms: u64,
  /// Retries per call on transient failures.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff, milliseconds).
  #[serde(default = "default_retry_base_delay")]
  pub retry_base_delay_ms: u64,
  /// Sustained request rate towards the RPC endpoint.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
  /// Contracts snapshotted concurrently per query.
  #[serde(default = "default_max_concurrent_contracts")]
  pub max_concurrent_contracts: usize,
  /// RPC calls in flight per query (contract and token-id calls combined).
  #[serde(default = "default_max_in_flight_calls")]
  pub max_in_flight_calls: usize,
  /// Largest non-fungible balance that will be enumerated.
  #[serde(default = "default_max_token_ids")]
  pub max_token_ids_per_contract: u64,
}

/// Per-query configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
  /// Deadline for snapshot + order fetch (milliseconds).
  #[serde(default = "default_query_timeout")]
  pub timeout_ms: u64,
  /// Relevance granularity.
  #[serde(default)]
  pub policy: RelevancePolicy,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      timeout_ms: default_query_timeout(),
      policy: RelevancePolicy::default(),
    }
  }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Bind address for the query, health and metrics endpoints.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind_address: default_bind_address(),
    }
  }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Expose `/metrics`.
  #[serde(default = "default_true")]
  pub enabled: bool,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self { enabled: true }
  }
}

/// Order store backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum OrderStoreConfig {
  /// JSONL file, one order record per line.
  File {
    /// Path to the JSONL file.
    path: String,
  },
  /// Document store exposing the full book as a JSON array.
  Http {
    /// Collection URL.
    url: String,
    /// Request timeout (milliseconds).
    #[serde(default = "default_store_timeout")]
    timeout_ms: u64,
    /// Retries on transient errors.
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    /// Base retry delay (milliseconds), doubled per attempt.
    #[serde(default = "default_retry_base_delay")]
    retry_base_delay_ms: u64,
  },
}

/// Whitelisted contracts of one network: symbol → address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkWhitelist {
  /// Fungible (ERC-20) contracts.
  #[serde(default)]
  pub erc20: BTreeMap<String, String>,
  /// Non-fungible (ERC-721 enumerable) contracts.
  #[serde(default)]
  pub erc721: BTreeMap<String, String>,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_call_timeout() -> u64 {
  10_000
}

fn default_max_retries() -> u32 {
  2
}

fn default_retry_base_delay() -> u64 {
  200
}

fn default_requests_per_second() -> u32 {
  25
}

fn default_max_concurrent_contracts() -> usize {
  8
}

fn default_max_in_flight_calls() -> usize {
  16
}

fn default_max_token_ids() -> u64 {
  1_000
}

fn default_query_timeout() -> u64 {
  15_000
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_store_timeout() -> u64 {
  10_000
}
