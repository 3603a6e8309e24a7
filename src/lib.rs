//! Authenticated reverse-proxy gateway library.
//!
//! Sits between a browser-facing dashboard and one remote backend API:
//! injects audience-scoped bearer tokens, sanitizes headers in both
//! directions, and normalizes responses for the browser.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
