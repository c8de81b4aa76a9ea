//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (chain RPC, order stores) and exposes the use
//! cases over HTTP. Each sub-module groups adapters by infrastructure
//! concern.
//!
//! Adapter categories:
//! - `chain`: ERC-20 / ERC-721 reads via alloy-rs
//! - `orders`: JSONL file and HTTP document-store order books
//! - `http`: axum query, health and metrics routes
//! - `metrics`: Prometheus registry and health state

pub mod chain;
pub mod http;
pub mod metrics;
pub mod orders;
