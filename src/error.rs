//! Request-scoped gateway errors.
//!
//! Nothing here is fatal to the process. Every variant is scoped to the
//! single request being handled and maps to the JSON error envelope
//! `{"error": "<description>"}` that the dashboard expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while proxying a single request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure contacting the upstream backend
    /// (connection refused, DNS failure, reset mid-response).
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// The upstream call exceeded the configured timeout.
    #[error("upstream request timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// No credential could be obtained and the auth policy is fail-closed.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// The outbound target could not be assembled into a valid request.
    #[error("invalid outbound target: {0}")]
    BadTarget(String),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(error = %self, status = %status, "request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
