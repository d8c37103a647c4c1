//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the tenant gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Tenant resolution: host parsing mode and backend origin template.
    pub tenancy: TenancyConfig,

    /// Response header sanitization rules.
    pub sanitizer: SanitizerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Platform tenant directory used by API clients.
    pub directory: DirectoryConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Path prefix of the forwarding endpoint on this listener.
    pub api_prefix: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            api_prefix: "/api".to_string(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Which hostname parsing regime to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    /// Decide per request: `*.localhost` hosts are local, everything else production.
    #[default]
    Auto,
    Local,
    Production,
}

/// Tenant resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TenancyConfig {
    /// Host parsing mode.
    pub mode: ModeSetting,

    /// Scheme used for templated backend origins.
    pub backend_scheme: String,

    /// Backend domain suffix. A tenant `acme` resolves to
    /// `{backend_scheme}://acme.{backend_domain}`.
    pub backend_domain: String,

    /// Explicit origin for requests without a tenant. Defaults to
    /// `{backend_scheme}://{backend_domain}`.
    pub root_origin: Option<String>,

    /// Per-tenant pinned origins that bypass the template.
    pub origins: BTreeMap<String, String>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            mode: ModeSetting::Auto,
            backend_scheme: "https".to_string(),
            backend_domain: "api.condominio.app".to_string(),
            root_origin: None,
            origins: BTreeMap::new(),
        }
    }
}

/// How `Set-Cookie` is treated on 4xx responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CookiePolicy {
    /// Remove every `Set-Cookie` header.
    #[default]
    StripAll,
    /// Remove only directives that clear a cookie.
    StripClearing,
    /// Relay `Set-Cookie` unchanged.
    Preserve,
}

/// Response sanitizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Policy for `Set-Cookie` on client-error statuses.
    pub cookie_policy: CookiePolicy,

    /// Content-Encoding tokens the callers cannot decode.
    pub unsupported_encodings: Vec<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            cookie_policy: CookiePolicy::StripAll,
            unsupported_encodings: vec!["zstd".to_string()],
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream request timeout (until response headers arrive) in seconds.
    pub request_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Platform tenant directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// URL returning the list of known tenants.
    pub url: String,

    /// Lookup timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: "https://api.condominio.app/api/condominios".to_string(),
            timeout_secs: 10,
        }
    }
}
