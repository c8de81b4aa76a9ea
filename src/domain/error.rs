//! Error Taxonomy - Typed Failures for the Relevance Pipeline
//!
//! Failures are split by blast radius:
//! - Query-fatal: `RelevanceError` (bad address, repository down, deadline, cancel)
//! - Contract-local: `ChainError`, folded into a `ContractQueryFailure` record
//! - Order-local: `MalformedOrder`, skipped by the matcher
//! - Startup-fatal: `RegistryError`

use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use thiserror::Error;

use super::token::TokenStandard;

/// Errors that abort a single relevance query.
///
/// Each variant maps to a distinct HTTP status so callers can tell
/// client mistakes apart from transient server-side failures.
#[derive(Debug, Error)]
pub enum RelevanceError {
    /// Missing, multi-valued, or malformed wallet address. Never retried.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The order store could not be read. Eligible for retry with backoff.
    #[error("Order repository unavailable: {0}")]
    RepositoryUnavailable(#[from] RepositoryError),

    /// The query deadline elapsed before both data sources completed.
    #[error("Query timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The query was cancelled (service shutting down).
    #[error("Query cancelled")]
    Cancelled,
}

impl RelevanceError {
    /// Whether a caller may reasonably retry the same request.
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidAddress(_))
    }

    /// Stable label for metrics and logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::RepositoryUnavailable(_) => "repository_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Errors from a single read-only contract call.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport or JSON-RPC level failure (includes reverts).
    #[error("RPC call {call} failed: {message}")]
    Rpc {
        /// ABI function name.
        call: &'static str,
        /// Provider error rendered as text.
        message: String,
    },

    /// The call did not return within the configured per-call timeout.
    #[error("RPC call {call} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// ABI function name.
        call: &'static str,
        /// Elapsed budget.
        after: Duration,
    },

    /// A non-fungible balance too large to enumerate one index at a time.
    #[error("balance {balance} exceeds enumeration limit {limit}")]
    EnumerationLimit {
        /// Reported `balanceOf`.
        balance: U256,
        /// Configured `max_token_ids_per_contract`.
        limit: u64,
    },

    /// `tokenOfOwnerByIndex` yielded fewer distinct ids than `balanceOf`.
    #[error("enumerated {distinct} distinct token ids, expected {expected}")]
    InconsistentEnumeration {
        /// Reported `balanceOf`.
        expected: u64,
        /// Distinct ids actually collected.
        distinct: usize,
    },

    /// Snapshot-local permit pool was closed.
    #[error("call permits closed")]
    PermitsClosed,
}

/// Errors from the order store boundary.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode store response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Startup errors from the contract whitelist.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{network}/{symbol}: malformed contract address {value:?}")]
    MalformedAddress {
        network: String,
        symbol: String,
        value: String,
    },

    #[error("{network}/{symbol}: zero address is not a token contract")]
    ZeroAddress { network: String, symbol: String },

    #[error("{network}/{symbol}: duplicate symbol")]
    DuplicateSymbol { network: String, symbol: String },
}

/// One contract omitted from a snapshot because its queries failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQueryFailure {
    pub contract_address: Address,
    pub symbol: String,
    pub standard: TokenStandard,
    pub reason: String,
}

/// An order record the matcher could not decompose into item lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order {order_id}: {reason}")]
pub struct MalformedOrder {
    pub order_id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_not_retryable() {
        assert!(!RelevanceError::InvalidAddress("x".into()).is_retryable());
        assert!(RelevanceError::Cancelled.is_retryable());
        assert!(RelevanceError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = RelevanceError::InvalidAddress("not-an-address".into());
        assert_eq!(err.to_string(), "Invalid address: not-an-address");

        let err = RelevanceError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Query timed out after 1500ms");

        let err = ChainError::InconsistentEnumeration {
            expected: 3,
            distinct: 2,
        };
        assert_eq!(
            err.to_string(),
            "enumerated 2 distinct token ids, expected 3"
        );
    }
}
