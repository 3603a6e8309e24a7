//! Configuration subsystem.
//!
//! Configuration is loaded once at startup (TOML file plus environment
//! overlay), validated, and then treated as immutable for the lifetime of
//! the process.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError, BACKEND_API_BASE};
pub use schema::{
    BackendConfig, GatewayConfig, IdentityConfig, ListenerConfig, ObservabilityConfig,
    RouteConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
