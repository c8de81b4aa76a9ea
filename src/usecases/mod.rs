//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the service's workflows.
//!
//! Use cases:
//! - `BalanceSnapshotter`: Wallet holdings across the contract whitelist
//! - `RelevanceService`: Snapshot ∥ order fetch, then match, under a deadline

pub mod relevance;
pub mod snapshotter;

pub use relevance::{RelevanceReport, RelevanceService};
pub use snapshotter::{BalanceSnapshotter, Snapshot, SnapshotLimits};
