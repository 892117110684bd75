//! API error types for the contextd server.
//!
//! Maps core domain errors to HTTP status codes and JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use contextd_core::error::ProviderError;

/// API error type for route handlers.
pub enum ApiError {
    /// Upstream provider failure.
    Provider(ProviderError),
    /// Requested resource not found.
    NotFound(String),
    /// Bad request (invalid query parameters, etc.).
    BadRequest(String),
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Provider(e) => {
                tracing::error!("provider error: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
