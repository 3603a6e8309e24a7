//! Observability: structured logging lives with `tracing` at the call
//! sites; this module owns metrics exposition.

pub mod metrics;
