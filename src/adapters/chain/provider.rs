//! Chain RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the connection to the configured EVM network via alloy-rs.
//! Validates RPC connectivity (and optionally the chain id) at startup
//! and exposes a shared provider instance for all contract reads.
//!
//! The HTTP transport is boxed so the provider type stays nameable.
//! `RootProvider` is a cheap handle over a shared client; clones reuse
//! the same connection pool.

use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::transports::BoxTransport;
use anyhow::{Context, Result};
use tracing::{info, instrument};

/// Read-only alloy provider shared by all chain adapters.
pub type SharedProvider = RootProvider<BoxTransport>;

/// Shared chain RPC provider backed by alloy-rs 0.9.
///
/// All chain adapters share a single provider instance to avoid
/// redundant connections and enable connection pooling.
pub struct ChainProvider {
    /// The alloy HTTP provider.
    provider: SharedProvider,
    /// Chain id reported at connect time.
    chain_id: u64,
}

impl ChainProvider {
    /// Connect to the RPC endpoint and validate the chain id.
    ///
    /// `rpc_url` is the fully expanded endpoint (credential included),
    /// so it is never logged.
    #[instrument(skip_all)]
    pub async fn connect(rpc_url: &str, expected_chain_id: Option<u64>) -> Result<Self> {
        let provider = http_provider(rpc_url)?;

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if let Some(expected) = expected_chain_id {
            anyhow::ensure!(
                chain_id == expected,
                "Expected chain_id={expected}, RPC reports {chain_id}"
            );
        }

        info!(chain_id, "Connected to chain RPC");

        Ok(Self { provider, chain_id })
    }

    /// Handle to the shared alloy provider.
    pub fn inner(&self) -> SharedProvider {
        self.provider.clone()
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}

/// Build an HTTP provider without touching the network.
pub fn http_provider(rpc_url: &str) -> Result<SharedProvider> {
    let url = rpc_url.parse().context("Invalid RPC URL")?;
    let client = RpcClient::new_http(url).boxed();
    Ok(ProviderBuilder::new().on_client(client))
}
