//! Lifecycle management.
//!
//! Startup is fail-fast: config loads and validates before the listener
//! binds. Shutdown is graceful: stop accepting, drain, exit.

pub mod shutdown;

pub use shutdown::Shutdown;
