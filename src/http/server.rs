//! HTTP server setup and the gateway request pipeline.
//!
//! # Responsibilities
//! - Build the axum Router with the wildcard proxy mount
//! - Wire up middleware (request id, tracing, CORS, timeout, route guard)
//! - Orchestrate the per-request chain: token acquisition → header
//!   policy → forwarder → response normalizer
//! - Serve with graceful shutdown

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthFallback, HttpIdentityProvider, IdentityProvider};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::cors::cors_middleware;
use crate::http::forward::{classify_redirect, Forwarder, RedirectMode, RedirectOutcome};
use crate::http::middleware::route_guard;
use crate::http::policy;
use crate::http::request::MakeRequestUuid;
use crate::http::response;
use crate::observability::metrics;
use crate::routing::PublicPaths;

/// Application state injected into handlers. Everything here is immutable
/// after startup; concurrent requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub identity: Arc<dyn IdentityProvider>,
    pub public_paths: Arc<PublicPaths>,
    pub manual_redirect_prefixes: Arc<Vec<String>>,
    pub sign_in_path: String,
    pub audience: String,
    pub fallback: AuthFallback,
}

impl AppState {
    /// Redirect handling for this path: manual for configured prefixes
    /// (OAuth callback hops), follow everywhere else.
    pub fn redirect_mode(&self, path: &str) -> RedirectMode {
        if self
            .manual_redirect_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            RedirectMode::Manual
        } else {
            RedirectMode::Follow
        }
    }
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server with the HTTP identity provider from config.
    pub fn new(config: GatewayConfig) -> Self {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(HttpIdentityProvider::new(&config.identity.base_url));
        Self::with_identity(config, identity)
    }

    /// Create a server with a custom identity provider (tests inject
    /// stubs here).
    pub fn with_identity(config: GatewayConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        let forwarder = Arc::new(Forwarder::new(
            config.backend.normalized_base(),
            Duration::from_secs(config.timeouts.upstream_secs),
        ));

        let state = AppState {
            forwarder,
            identity,
            public_paths: Arc::new(PublicPaths::new(config.routes.public_paths.clone())),
            manual_redirect_prefixes: Arc::new(config.routes.manual_redirect_prefixes.clone()),
            sign_in_path: config.routes.sign_in_path.clone(),
            audience: config.identity.audience.clone(),
            fallback: config.identity.fallback,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the axum router. Layers added later wrap the ones before,
    /// so the request id layer is outermost and the route guard runs
    /// right before the handler.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .layer(middleware::from_fn_with_state(state.clone(), route_guard))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(middleware::from_fn(cors_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.base_url,
            "gateway starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main gateway handler: one invocation per proxied request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(crate::http::request::X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match handle(&state, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = %response.status(),
        "proxied request"
    );
    response
}

async fn handle(state: &AppState, request: Request<Body>) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();
    let query = parts.uri.query();

    // Best-effort credential; the fallback policy decides what a missing
    // one means.
    let credential = match state.identity.mint_token(&state.audience, &parts.headers).await {
        Ok(credential) => credential,
        Err(e) => match state.fallback {
            AuthFallback::Open => {
                tracing::warn!(error = %e, "token acquisition failed, forwarding unauthenticated");
                None
            }
            AuthFallback::Closed => {
                return Err(GatewayError::AuthRequired(e.to_string()));
            }
        },
    };
    if credential.is_none() && state.fallback == AuthFallback::Closed {
        return Err(GatewayError::AuthRequired(
            "no credential available for the backend audience".to_string(),
        ));
    }

    let headers = policy::filter_request_headers(&parts.headers, credential.as_ref());
    let mode = state.redirect_mode(path);

    let upstream = state
        .forwarder
        .forward(parts.method.clone(), path, query, headers, body, mode)
        .await?;

    if mode == RedirectMode::Manual {
        if let RedirectOutcome::Rewrite(location) =
            classify_redirect(upstream.status(), upstream.headers())
        {
            // The re-issued 3xx keeps the upstream's client-safe headers
            // (an OAuth hop sets state cookies alongside Location).
            let mut response = Response::new(Body::empty());
            *response.status_mut() = upstream.status();
            *response.headers_mut() = policy::filter_response_headers(upstream.headers());
            response.headers_mut().insert(header::LOCATION, location);
            return Ok(response);
        }
    }

    response::normalize(upstream.map(Body::new)).await
}
