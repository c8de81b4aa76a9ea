//! HTTP Error Mapping - Status Codes for Query Failures
//!
//! Every error body is a bare JSON string, so clients can display it
//! without knowing an error schema.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::error::RelevanceError;

/// An error response: status plus a JSON string message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<RelevanceError> for ApiError {
    fn from(err: RelevanceError) -> Self {
        let status = match &err {
            RelevanceError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            RelevanceError::RepositoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelevanceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelevanceError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.message)).into_response()
    }
}

impl IntoResponse for RelevanceError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
