//! Route guard middleware.
//!
//! Classifies inbound paths as public or protected. Protected paths must
//! carry a valid session before the gateway chain runs; this is the only
//! place session validity is enforced. The forwarder never authorizes, it
//! only attaches credentials.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::http::server::AppState;

pub async fn route_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.public_paths.is_public(&path) {
        return next.run(request).await;
    }

    match state.identity.session(request.headers()).await {
        Ok(Some(session)) => {
            tracing::debug!(user_id = %session.user_id, path = %path, "session verified");
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!(path = %path, "no session, redirecting to sign-in");
            sign_in_redirect(&state, &path)
        }
        Err(e) => {
            // An unreachable identity service is indistinguishable from
            // "no session" for the guard's purposes.
            tracing::warn!(error = %e, path = %path, "session check failed");
            sign_in_redirect(&state, &path)
        }
    }
}

fn sign_in_redirect(state: &AppState, path: &str) -> Response {
    let location = format!("{}?redirect_url={}", state.sign_in_path, path);
    Redirect::temporary(&location).into_response()
}
