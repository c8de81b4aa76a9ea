//! Chain Adapters - EVM Token Contract Reads
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management with chain id validation
//! - ERC-20 / ERC-721 read calls behind a rate-limit + retry envelope

pub mod contracts;
pub mod provider;

pub use contracts::{CallPolicy, TokenContracts};
pub use provider::{ChainProvider, SharedProvider, http_provider};
