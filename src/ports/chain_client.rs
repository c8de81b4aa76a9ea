//! Chain Client Port - Read-only Token Contract Interface
//!
//! The minimal ABI surface the balance snapshot needs from a chain
//! node: `balanceOf`, `decimals`, `symbol` and `tokenOfOwnerByIndex`.
//! `balanceOf` has the same selector on ERC-20 and ERC-721, so one
//! method serves both standards.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::domain::error::ChainError;

/// Trait for read-only token contract calls.
///
/// Implementations own timeouts, retries and rate limiting; callers
/// treat every error as a failure of that one contract.
#[async_trait]
pub trait TokenContractReader: Send + Sync + 'static {
  /// `balanceOf(owner)` on an ERC-20 or ERC-721 contract.
  async fn balance_of(&self, contract: Address, owner: Address) -> Result<U256, ChainError>;

  /// `decimals()` on an ERC-20 contract.
  async fn decimals(&self, contract: Address) -> Result<u8, ChainError>;

  /// `symbol()` on an ERC-20 or ERC-721 contract.
  async fn symbol(&self, contract: Address) -> Result<String, ChainError>;

  /// `tokenOfOwnerByIndex(owner, index)` on an enumerable ERC-721 contract.
  async fn token_of_owner_by_index(
    &self,
    contract: Address,
    owner: Address,
    index: U256,
  ) -> Result<U256, ChainError>;

  /// Check if the chain connection is healthy.
  async fn is_healthy(&self) -> bool;
}
