//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every origin in the config is a bare scheme + host URL
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a valid origin ({reason})")]
    InvalidOrigin {
        field: String,
        value: String,
        reason: String,
    },

    #[error("tenancy.origins: '{0}' is not a valid tenant label")]
    InvalidTenantLabel(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("listener.api_prefix must start with '/' and not end with '/', got '{0}'")]
    InvalidPrefix(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let prefix = &config.listener.api_prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) || prefix == "/" {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    let tenancy = &config.tenancy;
    let template = format!("{}://{}", tenancy.backend_scheme, tenancy.backend_domain);
    if let Err(reason) = check_origin(&template) {
        errors.push(ValidationError::InvalidOrigin {
            field: "tenancy.backend_scheme/backend_domain".to_string(),
            value: template,
            reason,
        });
    }
    if let Some(root) = &tenancy.root_origin {
        if let Err(reason) = check_origin(root) {
            errors.push(ValidationError::InvalidOrigin {
                field: "tenancy.root_origin".to_string(),
                value: root.clone(),
                reason,
            });
        }
    }
    for (tenant, origin) in &tenancy.origins {
        if !is_label(tenant) {
            errors.push(ValidationError::InvalidTenantLabel(tenant.clone()));
        }
        if let Err(reason) = check_origin(origin) {
            errors.push(ValidationError::InvalidOrigin {
                field: format!("tenancy.origins.{tenant}"),
                value: origin.clone(),
                reason,
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }
    if config.directory.timeout_secs == 0 {
        errors.push(ValidationError::Zero("directory.timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is an http(s) URL with a host and nothing after it.
pub(crate) fn check_origin(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err("origin must not carry a path, query or fragment".to_string());
    }
    Ok(url)
}

fn is_label(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.tenancy.root_origin = Some("http://root.internal/with/path".into());
        config
            .tenancy
            .origins
            .insert("Bad_Label".into(), "ftp://files.internal".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.contains(&ValidationError::Zero("timeouts.request_secs")));
        assert!(errors.contains(&ValidationError::InvalidTenantLabel("Bad_Label".into())));
    }

    #[test]
    fn rejects_bad_prefix() {
        let mut config = GatewayConfig::default();
        config.listener.api_prefix = "api/".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidPrefix("api/".into())]);
    }

    #[test]
    fn origin_with_port_is_accepted() {
        assert!(check_origin("http://127.0.0.1:9000").is_ok());
        assert!(check_origin("https://acme.condominio.app").is_ok());
        assert!(check_origin("https://acme.condominio.app/api").is_err());
    }
}
