//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding the upstream backend base URL.
pub const BACKEND_API_BASE: &str = "BACKEND_API_BASE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides on top of the loaded configuration.
///
/// `BACKEND_API_BASE` replaces the configured upstream base URL so the
/// same config file works across environments.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(base) = std::env::var(BACKEND_API_BASE) {
        if !base.is_empty() {
            config.backend.base_url = base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the process-wide env var is never touched concurrently.
    #[test]
    fn env_override_replaces_backend_base() {
        let mut config = GatewayConfig::default();
        std::env::set_var(BACKEND_API_BASE, "https://api.staging.example.com");
        apply_env_overrides(&mut config);
        assert_eq!(config.backend.base_url, "https://api.staging.example.com");

        let mut config = GatewayConfig::default();
        std::env::set_var(BACKEND_API_BASE, "");
        apply_env_overrides(&mut config);
        assert_eq!(config.backend.base_url, "http://localhost:8000");

        std::env::remove_var(BACKEND_API_BASE);
    }
}
