//! Domain layer - Core relevance logic and models.
//!
//! Pure types and algorithms: the contract whitelist, wallet holdings,
//! order decomposition, and the relevance matcher. No I/O here
//! (hexagonal architecture inner ring); everything is testable in isolation.

pub mod address;
pub mod error;
pub mod matcher;
pub mod order;
pub mod token;

// Re-export core types for convenience
pub use error::{
    ChainError, ContractQueryFailure, MalformedOrder, RegistryError, RelevanceError,
    RepositoryError,
};
pub use matcher::{InterestSet, MatchOutcome, RelevanceMatcher, RelevancePolicy};
pub use order::{ItemType, Order, OrderId, OrderItem, OrderRecord, RelevantOrder};
pub use token::{
    ContractDescriptor, ContractRegistry, Network, NetworkContracts, TokenHolding,
    TokenStandard, WhitelistEntry,
};
