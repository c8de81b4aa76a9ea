//! Token Contract Reads - ERC-20 / ERC-721 over alloy-rs
//!
//! Implements the `TokenContractReader` port with the minimal ABI
//! subsets the balance snapshot needs. Every call goes through the
//! same envelope: rate limiter, per-call timeout, and bounded retries
//! with exponential backoff for transport-level failures. Reverts and
//! decode errors are returned immediately.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::sol;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, warn};

use super::provider::SharedProvider;
use crate::config::ChainConfig;
use crate::domain::error::ChainError;
use crate::ports::chain_client::TokenContractReader;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }

    #[sol(rpc)]
    interface IERC721Enumerable {
        function balanceOf(address owner) external view returns (uint256);
        function symbol() external view returns (string);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
    }
}

/// Call envelope settings derived from `[chain]`.
#[derive(Debug, Clone)]
pub struct CallPolicy {
    /// Per-attempt timeout.
    pub call_timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt).
    pub retry_base_delay: Duration,
    /// Sustained request rate.
    pub requests_per_second: NonZeroU32,
}

impl From<&ChainConfig> for CallPolicy {
    fn from(config: &ChainConfig) -> Self {
        Self {
            call_timeout: Duration::from_millis(config.call_timeout_ms),
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            requests_per_second: NonZeroU32::new(config.requests_per_second)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

/// Read-only token contract client.
pub struct TokenContracts {
    /// Shared chain RPC provider.
    provider: SharedProvider,
    /// Timeout and retry settings.
    policy: CallPolicy,
    /// Process-wide RPC rate limiter.
    limiter: DefaultDirectRateLimiter,
}

impl TokenContracts {
    pub fn new(provider: SharedProvider, policy: CallPolicy) -> Self {
        let limiter = RateLimiter::direct(Quota::per_second(policy.requests_per_second));
        Self {
            provider,
            policy,
            limiter,
        }
    }

    /// Run one contract call inside the rate limit / timeout / retry envelope.
    async fn call<R, F, Fut>(&self, call: &'static str, make: F) -> Result<R, ChainError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<R, alloy::contract::Error>> + Send,
        R: Send,
    {
        let mut last_error = None;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                let delay = self.policy.retry_base_delay * 2u32.pow(attempt - 1);
                debug!(call, attempt, delay_ms = delay.as_millis(), "Retrying contract call");
                sleep(delay).await;
            }

            self.limiter.until_ready().await;

            match timeout(self.policy.call_timeout, make()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    let retryable = is_transient(&e);
                    let err = ChainError::Rpc {
                        call,
                        message: e.to_string(),
                    };
                    if !retryable {
                        return Err(err);
                    }
                    warn!(call, attempt, error = %err, "Contract call failed");
                    last_error = Some(err);
                }
                Err(_) => {
                    warn!(call, attempt, "Contract call timed out");
                    last_error = Some(ChainError::Timeout {
                        call,
                        after: self.policy.call_timeout,
                    });
                }
            }
        }

        Err(last_error.unwrap_or(ChainError::Timeout {
            call,
            after: self.policy.call_timeout,
        }))
    }
}

/// Transport failures are worth retrying; reverts and bad data are not.
fn is_transient(error: &alloy::contract::Error) -> bool {
    matches!(error, alloy::contract::Error::TransportError(e) if e.is_transport_error())
}

#[async_trait]
impl TokenContractReader for TokenContracts {
    #[instrument(skip(self), fields(contract = %contract))]
    async fn balance_of(&self, contract: Address, owner: Address) -> Result<U256, ChainError> {
        let token = IERC20::new(contract, &self.provider);
        let token = &token;
        self.call("balanceOf", move || async move {
            token.balanceOf(owner).call().await.map(|r| r._0)
        })
        .await
    }

    #[instrument(skip(self), fields(contract = %contract))]
    async fn decimals(&self, contract: Address) -> Result<u8, ChainError> {
        let token = IERC20::new(contract, &self.provider);
        let token = &token;
        self.call("decimals", move || async move {
            token.decimals().call().await.map(|r| r._0)
        })
        .await
    }

    #[instrument(skip(self), fields(contract = %contract))]
    async fn symbol(&self, contract: Address) -> Result<String, ChainError> {
        let token = IERC20::new(contract, &self.provider);
        let token = &token;
        self.call("symbol", move || async move {
            token.symbol().call().await.map(|r| r._0)
        })
        .await
    }

    #[instrument(skip(self), fields(contract = %contract, index = %index))]
    async fn token_of_owner_by_index(
        &self,
        contract: Address,
        owner: Address,
        index: U256,
    ) -> Result<U256, ChainError> {
        let token = IERC721Enumerable::new(contract, &self.provider);
        let token = &token;
        self.call("tokenOfOwnerByIndex", move || async move {
            token.tokenOfOwnerByIndex(owner, index).call().await.map(|r| r._0)
        })
        .await
    }

    async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolCall;

    use super::*;

    #[test]
    fn test_selectors_match_standard_abi() {
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IERC20::decimalsCall::SELECTOR, [0x31, 0x3c, 0xe5, 0x67]);
        assert_eq!(IERC20::symbolCall::SELECTOR, [0x95, 0xd8, 0x9b, 0x41]);
        assert_eq!(
            IERC721Enumerable::tokenOfOwnerByIndexCall::SELECTOR,
            [0x2f, 0x74, 0x5c, 0x59]
        );
        // One balanceOf serves both standards.
        assert_eq!(
            IERC20::balanceOfCall::SELECTOR,
            IERC721Enumerable::balanceOfCall::SELECTOR
        );
    }

    #[test]
    fn test_call_policy_from_config() {
        let config: ChainConfig = toml::from_str(
            r#"
rpc_url = "http://127.0.0.1:8545"
call_timeout_ms = 2500
requests_per_second = 10
"#,
        )
        .unwrap();

        let policy = CallPolicy::from(&config);
        assert_eq!(policy.call_timeout, Duration::from_millis(2500));
        assert_eq!(policy.requests_per_second.get(), 10);
        assert_eq!(policy.max_retries, 2);
    }
}
