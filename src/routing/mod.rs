//! Inbound path classification.
//!
//! There is exactly one upstream per deployment, so routing here is not
//! about picking a backend. It only decides which paths require a session
//! before the gateway chain runs.

pub mod matcher;

pub use matcher::PublicPaths;
