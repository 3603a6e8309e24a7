//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound target from the configured base plus path/query
//! - Preserve the original method; stream request bodies without buffering
//! - Follow redirects server-side, or surface them for rewriting
//! - Convert transport failures into request-scoped errors
//!
//! # Design Decisions
//! - The manual-redirect decision is a two-outcome state machine
//!   (`Passthrough` / `Rewrite`) instead of branching inside the call
//!   path, so both outcomes are testable in isolation
//! - Bodies are attached only for methods that can carry one
//! - A bounded timeout guards every upstream call; no retries, those
//!   belong to the caller

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use url::Url;

use crate::error::GatewayError;

/// How 3xx responses from the upstream are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Follow redirects server-side, like a normal HTTP client would.
    Follow,
    /// Leave redirects alone so the caller can rewrite the location.
    Manual,
}

/// Outcome of inspecting an upstream response in manual mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Not a redirect, or a 3xx without a usable location: hand the
    /// response through unmodified.
    Passthrough,
    /// Re-issue a redirect to the client pointing at this location.
    Rewrite(HeaderValue),
}

/// Classify an upstream response for manual-redirect handling.
pub fn classify_redirect(status: StatusCode, headers: &HeaderMap) -> RedirectOutcome {
    if !status.is_redirection() {
        return RedirectOutcome::Passthrough;
    }
    match headers.get(header::LOCATION) {
        Some(location) => RedirectOutcome::Rewrite(location.clone()),
        None => RedirectOutcome::Passthrough,
    }
}

/// GET and HEAD requests never carry a body through the gateway.
pub fn body_allowed(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// Hop cap for server-side redirect following.
const MAX_FOLLOW_HOPS: usize = 5;

/// Executes outbound HTTP calls against the configured backend.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    base_url: String,
    timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder for the given backend base URL. A trailing
    /// slash on the base is normalized away.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base: String = base_url.into();
        Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            base_url: base.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Outbound target: base + path + query, concatenated verbatim. The
    /// gateway performs no path sanitization; the upstream validates.
    pub fn target(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("{}{}?{}", self.base_url, path, query),
            None => format!("{}{}", self.base_url, path),
        }
    }

    /// Forward a request and return the raw upstream response.
    ///
    /// The body is streamed to the upstream as it arrives from the
    /// client; it is never buffered here. Dropping the returned future
    /// aborts the in-flight upstream call.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: HeaderMap,
        body: Body,
        mode: RedirectMode,
    ) -> Result<Response<Incoming>, GatewayError> {
        let target = self.target(path, query);
        let body = if body_allowed(&method) { body } else { Body::empty() };
        let response = self
            .dispatch(method.clone(), &target, headers.clone(), body)
            .await?;

        match mode {
            RedirectMode::Manual => Ok(response),
            RedirectMode::Follow => self.follow(method, target, headers, response).await,
        }
    }

    /// Issue one upstream call under the configured timeout.
    async fn dispatch(
        &self,
        method: Method,
        target: &str,
        headers: HeaderMap,
        body: Body,
    ) -> Result<Response<Incoming>, GatewayError> {
        let uri: Uri = target
            .parse()
            .map_err(|e| GatewayError::BadTarget(format!("{target}: {e}")))?;

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(outbound) = builder.headers_mut() {
            *outbound = headers;
        }
        let request = builder
            .body(body)
            .map_err(|e| GatewayError::BadTarget(e.to_string()))?;

        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(GatewayError::Upstream(e.to_string())),
            Err(_) => Err(GatewayError::UpstreamTimeout(self.timeout)),
        }
    }

    /// Server-side redirect following with a hop cap.
    ///
    /// 301/302/303 re-issue as GET without a body. 307/308 would need to
    /// replay a body stream that has already been sent, so for
    /// body-carrying methods the 3xx is handed through instead.
    async fn follow(
        &self,
        method: Method,
        first_target: String,
        headers: HeaderMap,
        mut response: Response<Incoming>,
    ) -> Result<Response<Incoming>, GatewayError> {
        let mut current = first_target;
        let mut method = method;

        for _ in 0..MAX_FOLLOW_HOPS {
            if !response.status().is_redirection() {
                return Ok(response);
            }
            let Some(location) = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Ok(response);
            };
            let Some(next) = resolve_location(&current, location) else {
                return Ok(response);
            };

            match response.status() {
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => {
                    method = Method::GET;
                }
                _ => {
                    if body_allowed(&method) {
                        return Ok(response);
                    }
                }
            }

            tracing::debug!(location = %next, "following upstream redirect");
            current = next;
            response = self
                .dispatch(method.clone(), &current, headers.clone(), Body::empty())
                .await?;
        }

        Ok(response)
    }
}

/// Resolve a possibly-relative `Location` against the current target.
fn resolve_location(current: &str, location: &str) -> Option<String> {
    let base = Url::parse(current).ok()?;
    base.join(location).ok().map(Into::into)
}
