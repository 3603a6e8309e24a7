//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files, and every section has a usable default so a bare config file (or
//! none at all) yields a working local-development setup.

use serde::{Deserialize, Serialize};

use crate::auth::AuthFallback;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream backend the gateway forwards to.
    pub backend: BackendConfig,

    /// Identity service and credential policy.
    pub identity: IdentityConfig,

    /// Route classification (public paths, sign-in flow, redirect modes).
    pub routes: RouteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream backend configuration. There is exactly one backend per
/// deployment; fixed-destination variants are expressed through
/// [`RouteConfig`], not separate backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Absolute base URL of the backend API. Overridable with the
    /// `BACKEND_API_BASE` environment variable.
    pub base_url: String,
}

impl BackendConfig {
    /// Base URL with any trailing slash normalized away, so concatenating
    /// an inbound path never produces a double slash.
    pub fn normalized_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            // Local-development fallback.
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Identity service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity service (session introspection and token
    /// minting). The gateway treats it as an opaque external authority.
    pub base_url: String,

    /// Audience the minted bearer tokens are scoped to.
    pub audience: String,

    /// What to do when no credential can be obtained: forward the request
    /// unauthenticated (`open`) or reject it with 401 (`closed`).
    pub fallback: AuthFallback,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9100".to_string(),
            audience: "backend".to_string(),
            fallback: AuthFallback::Open,
        }
    }
}

/// Route classification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Paths reachable without a session. The root path matches exactly;
    /// every other entry is a prefix.
    pub public_paths: Vec<String>,

    /// Where unauthenticated requests to protected paths are redirected.
    pub sign_in_path: String,

    /// Path prefixes whose upstream redirects are surfaced to the client
    /// with a rewritten Location instead of being followed server-side
    /// (e.g. an OAuth callback hop).
    pub manual_redirect_prefixes: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/".to_string(),
                "/sign-in".to_string(),
                "/sign-up".to_string(),
                "/api/proxy".to_string(),
                "/_next".to_string(),
                "/favicon.ico".to_string(),
            ],
            sign_in_path: "/sign-in".to_string(),
            manual_redirect_prefixes: Vec::new(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time budget for one inbound request in seconds.
    pub request_secs: u64,

    /// Timeout for a single upstream call in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_development() {
        let config = GatewayConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.routes.sign_in_path, "/sign-in");
        assert_eq!(config.identity.fallback, AuthFallback::Open);
        assert!(config.routes.public_paths.contains(&"/".to_string()));
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let backend = BackendConfig {
            base_url: "https://api.example.com/".to_string(),
        };
        assert_eq!(backend.normalized_base(), "https://api.example.com");

        let bare = BackendConfig {
            base_url: "https://api.example.com".to_string(),
        };
        assert_eq!(bare.normalized_base(), "https://api.example.com");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [backend]
            base_url = "https://api.example.com"

            [identity]
            fallback = "closed"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "https://api.example.com");
        assert_eq!(config.identity.fallback, AuthFallback::Closed);
        assert_eq!(config.timeouts.upstream_secs, 30);
    }
}
