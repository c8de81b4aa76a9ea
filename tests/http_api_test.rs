//! HTTP API Tests - Router Behaviour Over a Real Socket
//!
//! Serves the router on an ephemeral port and drives it with reqwest.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256, address};
use mockall::mock;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;

use seaport_relevance::adapters::http::{self, AppState};
use seaport_relevance::adapters::metrics::{HealthState, MetricsRegistry};
use seaport_relevance::domain::error::{ChainError, RepositoryError};
use seaport_relevance::domain::matcher::RelevanceMatcher;
use seaport_relevance::domain::order::OrderRecord;
use seaport_relevance::domain::token::{ContractRegistry, TokenStandard, WhitelistEntry};
use seaport_relevance::ports::chain_client::TokenContractReader;
use seaport_relevance::ports::repository::OrderRepository;
use seaport_relevance::usecases::{BalanceSnapshotter, RelevanceService, SnapshotLimits};

mock! {
    pub Chain {}

    #[async_trait::async_trait]
    impl TokenContractReader for Chain {
        async fn balance_of(&self, contract: Address, owner: Address) -> Result<U256, ChainError>;
        async fn decimals(&self, contract: Address) -> Result<u8, ChainError>;
        async fn symbol(&self, contract: Address) -> Result<String, ChainError>;
        async fn token_of_owner_by_index(
            &self,
            contract: Address,
            owner: Address,
            index: U256,
        ) -> Result<U256, ChainError>;
        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub Orders {}

    #[async_trait::async_trait]
    impl OrderRepository for Orders {
        async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, RepositoryError>;
        async fn is_healthy(&self) -> bool;
    }
}

const WALLET: &str = "0x17e547d79c04d01e49fea275cf32ba06554f9df7";
const AAA: Address = address!("000000000000000000000000000000000000aaaa");
const BBB: Address = address!("000000000000000000000000000000000000bbbb");

struct TestServer {
    base: String,
    health: HealthState,
    _shutdown: watch::Sender<bool>,
}

async fn spawn_server(chain: MockChain, orders: MockOrders) -> TestServer {
    let registry = ContractRegistry::from_entries([
        WhitelistEntry {
            network: "testnet".into(),
            standard: TokenStandard::Fungible,
            symbol: "aaa".into(),
            address: AAA.to_string(),
        },
        WhitelistEntry {
            network: "testnet".into(),
            standard: TokenStandard::NonFungible,
            symbol: "bbb".into(),
            address: BBB.to_string(),
        },
    ])
    .unwrap();

    let snapshotter = BalanceSnapshotter::new(
        Arc::new(chain),
        Arc::new(registry),
        SnapshotLimits::default(),
    );
    let service = RelevanceService::new(
        snapshotter,
        Arc::new(orders),
        RelevanceMatcher::default(),
        "testnet",
        Duration::from_secs(5),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let health = HealthState::new();
    let app = http::router(AppState {
        service: Arc::new(service),
        health: health.clone(),
        metrics: Some(Arc::new(MetricsRegistry::new().unwrap())),
        shutdown: shutdown_rx.clone(),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(http::serve(listener, app, shutdown_rx));

    TestServer {
        base,
        health,
        _shutdown: shutdown_tx,
    }
}

/// Wallet holds AAA; BBB balance lookups fail.
fn partial_chain() -> MockChain {
    let mut chain = MockChain::new();
    chain.expect_balance_of().returning(|contract, _| {
        if contract == AAA {
            Ok(U256::from(10))
        } else {
            Err(ChainError::Timeout {
                call: "balanceOf",
                after: Duration::from_millis(10),
            })
        }
    });
    chain.expect_decimals().returning(|_| Ok(18));
    chain.expect_symbol().returning(|_| Ok("AAA".into()));
    chain.expect_is_healthy().returning(|| true);
    chain
}

fn healthy_chain() -> MockChain {
    let mut chain = MockChain::new();
    chain
        .expect_balance_of()
        .returning(|contract, _| Ok(if contract == AAA { U256::from(10) } else { U256::ZERO }));
    chain.expect_decimals().returning(|_| Ok(18));
    chain.expect_symbol().returning(|_| Ok("AAA".into()));
    chain.expect_is_healthy().returning(|| true);
    chain
}

fn book() -> MockOrders {
    let mut orders = MockOrders::new();
    orders.expect_fetch_all_orders().returning(|| {
        Ok(vec![serde_json::from_value(json!({
            "id": "order-1",
            "parameters": {
                "offer": { "0": { "itemType": 1, "token": AAA.to_string(), "startAmount": "5" } },
                "consideration": {}
            }
        }))
        .unwrap()])
    });
    orders.expect_is_healthy().returning(|| true);
    orders
}

#[tokio::test]
async fn test_related_orders_by_path() {
    let server = spawn_server(healthy_chain(), book()).await;

    let resp = reqwest::get(format!("{}/relatedOrders/{WALLET}", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-query-id"));
    assert!(!resp.headers().contains_key("x-partial-result"));

    let body: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["_id"], "order-1");
    assert!(body[0]["parameters"]["offer"].is_object());
}

#[tokio::test]
async fn test_related_orders_by_query() {
    let server = spawn_server(healthy_chain(), book()).await;

    let resp = reqwest::get(format!("{}/relatedOrders?address={WALLET}", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(body.len(), 1);
}

#[tokio::test]
async fn test_invalid_address_is_400_json_string() {
    let server = spawn_server(MockChain::new(), MockOrders::new()).await;

    let resp = reqwest::get(format!("{}/relatedOrders/not-an-address", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let message: String = resp.json().await.unwrap();
    assert_eq!(message, "Invalid address: not-an-address");
}

#[tokio::test]
async fn test_missing_and_repeated_address_params_are_400() {
    let server = spawn_server(MockChain::new(), MockOrders::new()).await;

    let resp = reqwest::get(format!("{}/relatedOrders", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = reqwest::get(format!("{}/relatedOrders?address=a&address=b", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let message: String = resp.json().await.unwrap();
    assert_eq!(
        message,
        "Invalid param: expecting single string, got array: a,b"
    );
}

#[tokio::test]
async fn test_non_get_is_rejected() {
    let server = spawn_server(MockChain::new(), MockOrders::new()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/relatedOrders/{WALLET}", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let message: String = resp.json().await.unwrap();
    assert_eq!(message, "Unable to handle request");
}

#[tokio::test]
async fn test_partial_snapshot_sets_headers() {
    let server = spawn_server(partial_chain(), book()).await;

    let resp = reqwest::get(format!("{}/relatedOrders/{WALLET}", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-partial-result"], "true");
    assert_eq!(
        resp.headers()["x-failed-contracts"].to_str().unwrap(),
        BBB.to_string()
    );

    let body: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(body.len(), 1);
}

#[tokio::test]
async fn test_repository_failure_is_503() {
    let mut orders = MockOrders::new();
    orders
        .expect_fetch_all_orders()
        .returning(|| Err(RepositoryError::Status { status: 500, body: "boom".into() }));

    let server = spawn_server(healthy_chain(), orders).await;

    let resp = reqwest::get(format!("{}/relatedOrders/{WALLET}", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let message: String = resp.json().await.unwrap();
    assert!(message.starts_with("Order repository unavailable"));
}

#[tokio::test]
async fn test_holdings_endpoint() {
    let server = spawn_server(partial_chain(), MockOrders::new()).await;

    let resp = reqwest::get(format!("{}/holdings/{WALLET}", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-partial-result"], "true");

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["holdings"].as_array().unwrap().len(), 1);
    assert_eq!(body["holdings"][0]["standard"], "FUNGIBLE");
    assert_eq!(body["holdings"][0]["symbol"], "AAA");
    assert_eq!(body["failures"][0]["symbol"], "bbb");
}

#[tokio::test]
async fn test_probes_and_metrics() {
    let server = spawn_server(healthy_chain(), book()).await;

    let live = reqwest::get(format!("{}/live", server.base)).await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);

    let ready = reqwest::get(format!("{}/ready", server.base)).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    reqwest::get(format!("{}/relatedOrders/{WALLET}", server.base))
        .await
        .unwrap();
    let metrics = reqwest::get(format!("{}/metrics", server.base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains(r#"relevance_queries_total{outcome="ok"} 1"#));

    server.health.begin_shutdown();
    let ready = reqwest::get(format!("{}/ready", server.base)).await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}
