//! Configuration validation.
//!
//! Semantic validation on top of what serde already guarantees
//! syntactically. Returns all errors, not just the first, so an operator
//! can fix a config file in one pass. Pure function: `GatewayConfig →
//! Result<(), Vec<ValidationError>>`, run before the config is accepted.

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single validation failure, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn push(errors: &mut Vec<ValidationError>, field: &str, message: impl Into<String>) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.into(),
    });
}

fn check_base_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => push(
            errors,
            field,
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ),
        Err(e) => push(errors, field, format!("not an absolute URL: {e}")),
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        push(
            &mut errors,
            "listener.bind_address",
            format!("'{}' is not a valid socket address", config.listener.bind_address),
        );
    }

    check_base_url(&mut errors, "backend.base_url", &config.backend.base_url);
    check_base_url(&mut errors, "identity.base_url", &config.identity.base_url);

    if config.identity.audience.is_empty() {
        push(&mut errors, "identity.audience", "must not be empty");
    }

    if config.timeouts.request_secs == 0 {
        push(&mut errors, "timeouts.request_secs", "must be greater than zero");
    }
    if config.timeouts.upstream_secs == 0 {
        push(&mut errors, "timeouts.upstream_secs", "must be greater than zero");
    }
    if config.timeouts.upstream_secs > config.timeouts.request_secs {
        push(
            &mut errors,
            "timeouts.upstream_secs",
            "must not exceed timeouts.request_secs",
        );
    }

    if !config.routes.sign_in_path.starts_with('/') {
        push(&mut errors, "routes.sign_in_path", "must start with '/'");
    }
    for path in &config.routes.public_paths {
        if !path.starts_with('/') {
            push(
                &mut errors,
                "routes.public_paths",
                format!("'{path}' must start with '/'"),
            );
        }
    }
    for prefix in &config.routes.manual_redirect_prefixes {
        if !prefix.starts_with('/') {
            push(
                &mut errors,
                "routes.manual_redirect_prefixes",
                format!("'{prefix}' must start with '/'"),
            );
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        push(
            &mut errors,
            "observability.metrics_address",
            format!(
                "'{}' is not a valid socket address",
                config.observability.metrics_address
            ),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.backend.base_url = "not-a-url".into();
        config.timeouts.upstream_secs = 0;
        config.routes.sign_in_path = "sign-in".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"backend.base_url"));
        assert!(fields.contains(&"timeouts.upstream_secs"));
        assert!(fields.contains(&"routes.sign_in_path"));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let mut config = GatewayConfig::default();
        config.backend.base_url = "ftp://example.com".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "backend.base_url");
    }

    #[test]
    fn rejects_upstream_timeout_above_request_timeout() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 10;
        config.timeouts.upstream_secs = 20;
        assert!(validate_config(&config).is_err());
    }
}
