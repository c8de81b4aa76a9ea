//! Relevance Matcher - Holdings × Order Book Intersection
//!
//! An order is relevant to a wallet when at least one of its offer or
//! consideration items references a contract the wallet holds. Holdings
//! are hashed once into an interest set, so matching is
//! O(holdings + orders × items) and each order is visited exactly once,
//! which also makes duplicate emission impossible.
//!
//! `naive_match` keeps the nested-loop formulation as a correctness
//! reference for tests and benchmarks.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use alloy::primitives::{Address, U256};
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::MalformedOrder;
use super::order::{Order, OrderItem, OrderRecord, RelevantOrder};
use super::token::{TokenHolding, TokenStandard};

/// Granularity at which a holding makes an item relevant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevancePolicy {
    /// Any item on a held contract is relevant, whatever its token id.
    #[default]
    Contract,
    /// Identified non-fungible items must name a token id the wallet owns.
    /// Criteria-based items and fungible holdings still match by contract.
    ExactToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Interest {
    AnyToken,
    Tokens(HashSet<U256>),
}

/// Held contracts, keyed by address.
#[derive(Debug, Clone, Default)]
pub struct InterestSet {
    contracts: HashMap<Address, Interest>,
}

impl InterestSet {
    /// Hash holdings once under the given policy.
    pub fn from_holdings(holdings: &[TokenHolding], policy: RelevancePolicy) -> Self {
        let mut contracts: HashMap<Address, Interest> = HashMap::with_capacity(holdings.len());

        for holding in holdings {
            let incoming = match (policy, holding.standard) {
                (RelevancePolicy::ExactToken, TokenStandard::NonFungible) => {
                    Interest::Tokens(holding.token_ids.iter().copied().collect())
                }
                _ => Interest::AnyToken,
            };

            // Same contract listed under two symbols: widen, never narrow.
            match contracts.entry(holding.contract_address) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                Entry::Occupied(mut slot) => {
                    let widened = match (slot.get_mut(), incoming) {
                        (Interest::Tokens(ids), Interest::Tokens(more)) => {
                            ids.extend(more);
                            None
                        }
                        (Interest::Tokens(_), Interest::AnyToken) => Some(Interest::AnyToken),
                        (Interest::AnyToken, _) => None,
                    };
                    if let Some(any) = widened {
                        slot.insert(any);
                    }
                }
            }
        }

        Self { contracts }
    }

    /// Whether this item touches the wallet's interest.
    pub fn matches(&self, item: &OrderItem) -> bool {
        match self.contracts.get(&item.token) {
            None => false,
            Some(Interest::AnyToken) => true,
            Some(Interest::Tokens(ids)) => {
                if !item.item_type.is_identified() {
                    return true;
                }
                item.identifier_or_criteria.is_some_and(|id| ids.contains(&id))
            }
        }
    }

    pub fn contains(&self, contract: &Address) -> bool {
        self.contracts.contains_key(contract)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

/// Result of matching a raw record set.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Relevant orders, one per order id, sorted by id.
    pub relevant: Vec<RelevantOrder>,
    /// Records skipped because they could not be decomposed.
    pub malformed: Vec<MalformedOrder>,
}

/// Stateless matcher configured with a relevance policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceMatcher {
    policy: RelevancePolicy,
}

impl RelevanceMatcher {
    pub const fn new(policy: RelevancePolicy) -> Self {
        Self { policy }
    }

    pub const fn policy(&self) -> RelevancePolicy {
        self.policy
    }

    /// Decode raw records, skip malformed ones, and match the rest.
    pub fn match_records(
        &self,
        holdings: &[TokenHolding],
        records: impl IntoIterator<Item = OrderRecord>,
    ) -> MatchOutcome {
        let mut orders = Vec::new();
        let mut malformed = Vec::new();

        for record in records {
            match Order::from_record(record) {
                Ok(order) => orders.push(order),
                Err(anomaly) => {
                    warn!(
                        order_id = %anomaly.order_id,
                        reason = %anomaly.reason,
                        "Skipping malformed order"
                    );
                    malformed.push(anomaly);
                }
            }
        }

        MatchOutcome {
            relevant: self.match_orders(holdings, &orders),
            malformed,
        }
    }

    /// Relevant orders among already-decoded orders.
    pub fn match_orders(&self, holdings: &[TokenHolding], orders: &[Order]) -> Vec<RelevantOrder> {
        let interest = InterestSet::from_holdings(holdings, self.policy);
        if interest.is_empty() {
            return Vec::new();
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut relevant: Vec<RelevantOrder> = Vec::new();

        for order in orders {
            if seen.contains(order.id.as_str()) {
                continue;
            }
            if order.items().any(|item| interest.matches(item)) {
                seen.insert(order.id.as_str());
                relevant.push(RelevantOrder::from(order));
            }
        }

        relevant.sort_by(|a, b| a.order_id.cmp(&b.order_id));

        debug!(
            held_contracts = interest.len(),
            orders = orders.len(),
            relevant = relevant.len(),
            "Matched order book against holdings"
        );

        relevant
    }
}

/// Nested-loop reference: holdings × orders × items, contract policy.
///
/// Quadratic, kept only as a baseline for tests and benchmarks.
pub fn naive_match(holdings: &[TokenHolding], orders: &[Order]) -> Vec<RelevantOrder> {
    let mut relevant: Vec<RelevantOrder> = Vec::new();

    for holding in holdings {
        for order in orders {
            if relevant.iter().any(|r| r.order_id == order.id) {
                continue;
            }
            if order.items().any(|item| item.token == holding.contract_address) {
                relevant.push(RelevantOrder::from(order));
            }
        }
    }

    relevant.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    relevant
}
