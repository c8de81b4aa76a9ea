//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! expanding the RPC endpoint template, and providing clear error
//! messages for misconfiguration.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{AppConfig, ChainConfig, OrderStoreConfig};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    network = %config.service.network,
    networks = config.whitelist.len(),
    policy = ?config.query.policy,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Expand `{network}` and `{api_key}` in the RPC endpoint.
///
/// The credential is read from the environment variable named by
/// `api_key_env`; it is required only when the template uses it.
pub fn resolve_rpc_url(chain: &ChainConfig, network: &str) -> Result<String> {
  let mut url = chain.rpc_url.replace("{network}", network);

  if url.contains("{api_key}") {
    let var = chain
      .api_key_env
      .as_deref()
      .context("rpc_url uses {api_key} but chain.api_key_env is not set")?;
    let key = std::env::var(var)
      .with_context(|| format!("{var} not set"))?;
    url = url.replace("{api_key}", &key);
  }

  Ok(url)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty identity and endpoints
/// - Positive timeouts and fan-out limits
/// - A parseable bind address
fn validate_config(config: &AppConfig) -> Result<()> {
  // Service validation
  anyhow::ensure!(
    !config.service.network.is_empty(),
    "service.network must not be empty"
  );
  anyhow::ensure!(
    config
      .whitelist
      .get(&config.service.network)
      .is_some_and(|w| !w.erc20.is_empty() || !w.erc721.is_empty()),
    "whitelist has no contracts for service.network {:?}",
    config.service.network
  );

  // Chain validation
  let chain = &config.chain;
  anyhow::ensure!(!chain.rpc_url.is_empty(), "chain.rpc_url must not be empty");
  anyhow::ensure!(
    chain.call_timeout_ms > 0,
    "chain.call_timeout_ms must be positive"
  );
  anyhow::ensure!(
    chain.requests_per_second > 0,
    "chain.requests_per_second must be positive"
  );
  anyhow::ensure!(
    chain.max_concurrent_contracts > 0,
    "chain.max_concurrent_contracts must be positive"
  );
  anyhow::ensure!(
    chain.max_in_flight_calls > 0,
    "chain.max_in_flight_calls must be positive"
  );
  anyhow::ensure!(
    chain.max_token_ids_per_contract > 0,
    "chain.max_token_ids_per_contract must be positive"
  );

  // Query validation
  anyhow::ensure!(
    config.query.timeout_ms > 0,
    "query.timeout_ms must be positive"
  );

  // Server validation
  config
    .server
    .bind_address
    .parse::<SocketAddr>()
    .with_context(|| format!("Invalid server.bind_address: {}", config.server.bind_address))?;

  // Order store validation
  match &config.orders {
    OrderStoreConfig::File { path } => {
      anyhow::ensure!(!path.is_empty(), "orders.path must not be empty");
    }
    OrderStoreConfig::Http { url, timeout_ms, .. } => {
      anyhow::ensure!(!url.is_empty(), "orders.url must not be empty");
      anyhow::ensure!(*timeout_ms > 0, "orders.timeout_ms must be positive");
    }
  }

  Ok(())
}
