//! Session and credential handling.
//!
//! The identity provider is an opaque external service: it can tell the
//! gateway whether a request carries a valid session, and it can mint a
//! short-lived bearer token scoped to the backend's audience. The gateway
//! never inspects token contents, it only attaches them.

pub mod provider;

pub use provider::{AuthError, HttpIdentityProvider, IdentityProvider, Session};

use serde::{Deserialize, Serialize};

/// An opaque bearer token scoped to the backend audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Render as an `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// Policy for requests whose credential could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFallback {
    /// Forward the request unauthenticated; the backend re-validates.
    #[default]
    Open,
    /// Reject with 401 before contacting the backend.
    Closed,
}
