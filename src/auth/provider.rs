//! Identity service client.
//!
//! # Responsibilities
//! - Session introspection for the route guard
//! - Audience-scoped token minting for the forwarder
//!
//! # Design Decisions
//! - Token minting is best-effort: "no token" is a normal answer, not an
//!   error, so the proxy chain is never blocked on auth plumbing
//! - Inbound cookies are forwarded verbatim; the gateway holds no session
//!   state of its own

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::Credential;

/// Errors talking to the identity service.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity service unreachable: {0}")]
    Transport(String),

    #[error("identity service returned status {0}")]
    Status(u16),

    #[error("identity service returned a malformed body: {0}")]
    Malformed(String),
}

/// A validated session attached to protected requests.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub user_id: String,
}

/// External identity authority.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up the session for the inbound request, if any.
    async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError>;

    /// Mint a short-lived bearer token for the given audience.
    ///
    /// `Ok(None)` means no credential is available: no active session, or
    /// no token template configured for the audience. Callers decide what
    /// that means via the configured fallback policy.
    async fn mint_token(
        &self,
        audience: &str,
        headers: &HeaderMap,
    ) -> Result<Option<Credential>, AuthError>;
}

/// HTTP implementation talking to the identity service.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base.trim_end_matches('/').to_string(),
        }
    }

    fn cookies(headers: &HeaderMap) -> Option<&str> {
        headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        let mut request = self.client.get(format!("{}/session", self.base_url));
        if let Some(cookie) = Self::cookies(headers) {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let session: Session = response
                    .json()
                    .await
                    .map_err(|e| AuthError::Malformed(e.to_string()))?;
                Ok(Some(session))
            }
            401 | 404 => Ok(None),
            status => Err(AuthError::Status(status)),
        }
    }

    async fn mint_token(
        &self,
        audience: &str,
        headers: &HeaderMap,
    ) -> Result<Option<Credential>, AuthError> {
        let mut request = self
            .client
            .post(format!("{}/tokens/{}", self.base_url, audience));
        if let Some(cookie) = Self::cookies(headers) {
            request = request.header(header::COOKIE, cookie);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let body: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| AuthError::Malformed(e.to_string()))?;
                Ok(Some(Credential::new(body.token)))
            }
            // 401: no active session. 404: no token template for this
            // audience. Both degrade to "no credential".
            401 | 404 => Ok(None),
            status => Err(AuthError::Status(status)),
        }
    }
}
