//! Tenant → backend origin mapping.
//!
//! # Responsibilities
//! - Build the per-tenant origin from the configured template
//! - Honor pinned per-tenant origins
//! - Fall back to the root origin when there is no tenant
//!
//! # Design Decisions
//! - The template is validated once at construction so `resolve` is total
//! - Origins are kept as parsed URLs (scheme + host + optional port)

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::config::validation::check_origin;
use crate::config::TenancyConfig;
use crate::tenant::host::TenantId;

/// Scheme + host (+ port) of a backend service, without path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(Url);

impl Origin {
    /// Parse an origin, rejecting anything carrying a path or query.
    pub fn parse(value: &str) -> Result<Self, String> {
        check_origin(value).map(Self)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The origin without trailing slash, e.g. `https://acme.example.com`.
    pub fn as_str(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Join a path below this origin.
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.as_str(), path.trim_start_matches('/'))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an optional tenant to the origin serving it.
#[derive(Debug, Clone)]
pub struct OriginResolver {
    scheme: String,
    domain: String,
    root: Origin,
    pinned: HashMap<String, Origin>,
}

impl OriginResolver {
    /// Build a resolver from tenancy config.
    ///
    /// Fails only if the config was not validated first.
    pub fn from_config(config: &TenancyConfig) -> Result<Self, String> {
        let scheme = config.backend_scheme.to_ascii_lowercase();
        let domain = config.backend_domain.to_ascii_lowercase();

        let root = match &config.root_origin {
            Some(root) => Origin::parse(root)?,
            None => Origin::parse(&format!("{scheme}://{domain}"))?,
        };
        // Prove the template produces valid origins for any label.
        Origin::parse(&format!("{scheme}://tenant.{domain}"))?;

        let pinned = config
            .origins
            .iter()
            .map(|(tenant, origin)| -> Result<(String, Origin), String> {
                Ok((tenant.to_ascii_lowercase(), Origin::parse(origin)?))
            })
            .collect::<Result<HashMap<_, _>, String>>()?;

        Ok(Self {
            scheme,
            domain,
            root,
            pinned,
        })
    }

    /// Resolve the backend origin for a tenant. Never fails.
    pub fn resolve(&self, tenant: Option<&TenantId>) -> Origin {
        let Some(tenant) = tenant else {
            return self.root.clone();
        };
        if let Some(origin) = self.pinned.get(tenant.as_str()) {
            return origin.clone();
        }
        // A TenantId is a single DNS-safe label, so the templated URL
        // always parses when the template itself did.
        match Origin::parse(&format!("{}://{}.{}", self.scheme, tenant, self.domain)) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::error!(tenant = %tenant, error = %e, "Templated origin invalid, using root");
                self.root.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> OriginResolver {
        let mut config = TenancyConfig {
            backend_scheme: "https".into(),
            backend_domain: "api.platform.tld".into(),
            ..TenancyConfig::default()
        };
        config
            .origins
            .insert("pinned".into(), "http://10.0.0.7:8000".into());
        OriginResolver::from_config(&config).unwrap()
    }

    #[test]
    fn no_tenant_resolves_to_root() {
        assert_eq!(resolver().resolve(None).as_str(), "https://api.platform.tld");
    }

    #[test]
    fn tenant_becomes_subdomain_label() {
        let acme = TenantId::new("acme").unwrap();
        let origin = resolver().resolve(Some(&acme));
        assert_eq!(origin.as_str(), "https://acme.api.platform.tld");
        assert_eq!(origin.host().split('.').next(), Some("acme"));
    }

    #[test]
    fn pinned_origin_wins() {
        let pinned = TenantId::new("pinned").unwrap();
        assert_eq!(
            resolver().resolve(Some(&pinned)).as_str(),
            "http://10.0.0.7:8000"
        );
    }

    #[test]
    fn hosts_with_url_syntax_never_reach_the_template() {
        use crate::tenant::host::{parse_tenant, HostMode};

        let resolver = resolver();
        for host in ["a:b@evil.platform.tld", "%70inned.platform.tld"] {
            let tenant = parse_tenant(host, HostMode::Production);
            let origin = resolver.resolve(tenant.as_ref());
            assert_eq!(origin.as_str(), "https://api.platform.tld", "host {host}");
            assert!(origin.as_url().username().is_empty());
        }
    }

    #[test]
    fn explicit_root_origin() {
        let config = TenancyConfig {
            root_origin: Some("http://127.0.0.1:9000".into()),
            ..TenancyConfig::default()
        };
        let resolver = OriginResolver::from_config(&config).unwrap();
        assert_eq!(resolver.resolve(None).as_str(), "http://127.0.0.1:9000");
    }

    #[test]
    fn join_builds_target() {
        let origin = Origin::parse("http://127.0.0.1:9000").unwrap();
        assert_eq!(origin.join("/api/units"), "http://127.0.0.1:9000/api/units");
    }
}
