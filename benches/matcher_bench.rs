//! Matcher Benchmarks — Hashed vs Nested-Loop Matching
//!
//! Benchmarks the relevance matcher that runs once per query against
//! the full order book, next to the quadratic reference.
//!
//! Run with: cargo bench --bench matcher_bench

use std::collections::BTreeSet;

use alloy::primitives::{Address, U256};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::Map;

use seaport_relevance::domain::matcher::{RelevanceMatcher, RelevancePolicy, naive_match};
use seaport_relevance::domain::order::{ItemType, Order, OrderItem};
use seaport_relevance::domain::token::TokenHolding;

fn contract(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..].copy_from_slice(&n.to_be_bytes());
    Address::from(bytes)
}

/// `count` holdings alternating fungible and non-fungible.
fn holdings(count: u64) -> Vec<TokenHolding> {
    (0..count)
        .filter_map(|i| {
            if i % 2 == 0 {
                TokenHolding::fungible(contract(i), "FT".into(), U256::from(1_000u64), 18)
            } else {
                let ids: BTreeSet<U256> = (0..5u64).map(|id| U256::from(i * 10 + id)).collect();
                TokenHolding::non_fungible(contract(i), "NFT".into(), ids)
            }
        })
        .collect()
}

/// `count` orders over a contract space 10x the holdings.
fn orders(count: u64, contracts: u64) -> Vec<Order> {
    (0..count)
        .map(|i| {
            let item = |token: u64, item_type: ItemType| OrderItem {
                item_type,
                token: contract(token),
                identifier_or_criteria: Some(U256::from(i)),
                amount: Some(U256::from(1)),
            };
            Order {
                id: format!("order-{i:06}"),
                offer: vec![item((i * 7) % (contracts * 10), ItemType::Erc721)],
                consideration: vec![
                    item((i * 13) % (contracts * 10), ItemType::Erc20),
                    item(0, ItemType::Native),
                ],
                document: Map::new(),
            }
        })
        .collect()
}

/// Benchmark hashed matching against the nested-loop reference.
fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("relevance_match");

    for &book in &[1_000u64, 10_000] {
        let holdings = holdings(20);
        let orders = orders(book, 20);

        group.bench_with_input(BenchmarkId::new("hashed", book), &orders, |b, orders| {
            let matcher = RelevanceMatcher::new(RelevancePolicy::Contract);
            b.iter(|| matcher.match_orders(black_box(&holdings), black_box(orders)));
        });

        group.bench_with_input(BenchmarkId::new("naive", book), &orders, |b, orders| {
            b.iter(|| naive_match(black_box(&holdings), black_box(orders)));
        });
    }

    group.finish();
}

/// Benchmark exact-token matching (id lookups on non-fungible items).
fn bench_exact_token(c: &mut Criterion) {
    let holdings = holdings(20);
    let orders = orders(10_000, 20);
    let matcher = RelevanceMatcher::new(RelevancePolicy::ExactToken);

    c.bench_function("relevance_match_exact_token_10k", |b| {
        b.iter(|| matcher.match_orders(black_box(&holdings), black_box(&orders)));
    });
}

criterion_group!(benches, bench_match, bench_exact_token);
criterion_main!(benches);
