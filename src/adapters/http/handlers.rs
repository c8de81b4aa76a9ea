//! Route handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::error::ApiError;
use crate::domain::error::{ContractQueryFailure, RelevanceError};

const QUERY_ID: HeaderName = HeaderName::from_static("x-query-id");
const PARTIAL_RESULT: HeaderName = HeaderName::from_static("x-partial-result");
const FAILED_CONTRACTS: HeaderName = HeaderName::from_static("x-failed-contracts");

/// `GET /relatedOrders/{address}`
pub async fn related_orders_by_path(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    related_orders(&state, &address).await
}

/// `GET /relatedOrders?address=...`
///
/// A repeated `address` parameter is rejected rather than picking one.
pub async fn related_orders_by_query(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let values: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == "address")
        .map(|(_, value)| value)
        .collect();

    match values.as_slice() {
        [address] => related_orders(&state, address).await,
        [] => rejected(
            &state,
            RelevanceError::InvalidAddress("missing address parameter".into()).into(),
        ),
        _ => rejected(
            &state,
            ApiError::bad_request(format!(
                "Invalid param: expecting single string, got array: {}",
                values.join(",")
            )),
        ),
    }
}

/// `GET /holdings/{address}`
pub async fn holdings(State(state): State<AppState>, Path(address): Path<String>) -> Response {
    let started = Instant::now();

    match state.service.holdings(&address, state.shutdown.clone()).await {
        Ok(snapshot) => {
            if let Some(metrics) = &state.metrics {
                metrics.observe_latency("holdings", started.elapsed().as_secs_f64() * 1000.0);
                metrics.observe_failures(&snapshot.failures);
            }
            let mut headers = HeaderMap::new();
            annotate_partial(&mut headers, &snapshot.failures);
            (headers, Json(snapshot)).into_response()
        }
        Err(e) => {
            if let Some(metrics) = &state.metrics {
                metrics.observe_error(&e);
            }
            e.into_response()
        }
    }
}

/// Any method other than GET on the query routes.
pub async fn unsupported_method() -> ApiError {
    ApiError::bad_request("Unable to handle request")
}

/// Liveness probe: always returns 200 if the process is running.
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: 503 once shutdown begins or a dependency is down.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if !state.health.is_accepting() {
        return (StatusCode::SERVICE_UNAVAILABLE, "NOT READY");
    }

    if state.health.is_ready(state.service.is_ready().await) {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(metrics) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn related_orders(state: &AppState, address: &str) -> Response {
    match state
        .service
        .related_orders(address, state.shutdown.clone())
        .await
    {
        Ok(report) => {
            if let Some(metrics) = &state.metrics {
                metrics.observe_report(&report);
            }

            let mut headers = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(&report.query_id.to_string()) {
                headers.insert(QUERY_ID, value);
            }
            annotate_partial(&mut headers, &report.failures);

            (headers, Json(report.relevant)).into_response()
        }
        Err(e) => {
            if let Some(metrics) = &state.metrics {
                metrics.observe_error(&e);
            }
            e.into_response()
        }
    }
}

fn rejected(state: &AppState, err: ApiError) -> Response {
    if let Some(metrics) = &state.metrics {
        metrics
            .queries_total
            .with_label_values(&["invalid_address"])
            .inc();
    }
    err.into_response()
}

fn annotate_partial(headers: &mut HeaderMap, failures: &[ContractQueryFailure]) {
    if failures.is_empty() {
        return;
    }

    headers.insert(PARTIAL_RESULT, HeaderValue::from_static("true"));

    let contracts = failures
        .iter()
        .map(|f| f.contract_address.to_string())
        .collect::<Vec<_>>()
        .join(",");
    if let Ok(value) = HeaderValue::from_str(&contracts) {
        headers.insert(FAILED_CONTRACTS, value);
    }
}
