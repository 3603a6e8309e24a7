//! Response normalization.
//!
//! # Responsibilities
//! - Strip encoding/framing headers that no longer describe the body
//! - Default a JSON content type when the upstream sent none
//! - Buffer bodies fully so framing is finalized before the reply
//!
//! # Design Decisions
//! - 204 responses always carry an empty body
//! - Full buffering trades streaming throughput for encoding correctness:
//!   the stripped framing headers must not outlive the bytes they
//!   described

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::error::GatewayError;
use crate::http::policy;

/// Content type assumed when the upstream does not say.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Normalize an upstream response for the client.
///
/// Status codes pass through verbatim, 3xx/4xx/5xx included; the gateway
/// never reinterprets backend-defined error semantics.
pub async fn normalize(upstream: Response<Body>) -> Result<Response<Body>, GatewayError> {
    let (parts, body) = upstream.into_parts();
    let status = parts.status;

    let mut headers = policy::filter_response_headers(&parts.headers);
    if status != StatusCode::NO_CONTENT && !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
        );
    }

    let body = if status == StatusCode::NO_CONTENT {
        Body::empty()
    } else {
        let bytes = to_bytes(body, usize::MAX)
            .await
            .map_err(|e| GatewayError::Upstream(format!("reading upstream body: {e}")))?;
        Body::from(bytes)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
