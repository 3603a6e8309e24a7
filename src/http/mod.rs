//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware (request id, trace, CORS preflight, route guard)
//!     → policy.rs (strip request headers, force identity encoding,
//!       inject credential)
//!     → forward.rs (build target, stream body, redirect handling)
//!     → response.rs (strip response headers, buffer, finalize)
//!     → Send to client
//! ```

pub mod cors;
pub mod forward;
pub mod middleware;
pub mod policy;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forwarder, RedirectMode, RedirectOutcome};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::GatewayServer;
