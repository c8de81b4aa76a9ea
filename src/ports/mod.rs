//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use-case layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `TokenContractReader`: Read-only token contract calls over chain RPC
//! - `OrderRepository`: Full-book reads from the order store

pub mod chain_client;
pub mod repository;

pub use chain_client::TokenContractReader;
pub use repository::OrderRepository;
