//! Tenant context derived once from the application's own host name.

use crate::config::ModeSetting;
use crate::tenant::{parse_tenant, strip_port, HostMode, Origin, TenantId};

/// Read-only tenant context for everything that builds API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    hostname: String,
    mode: HostMode,
    tenant: Option<TenantId>,
}

impl TenantContext {
    pub fn from_hostname(hostname: &str, setting: ModeSetting) -> Self {
        let mode = HostMode::for_host(setting, hostname);
        Self {
            hostname: strip_port(hostname).to_ascii_lowercase(),
            mode,
            tenant: parse_tenant(hostname, mode),
        }
    }

    /// Context for the host of a local (browser-facing) origin.
    pub fn for_origin(origin: &Origin, setting: ModeSetting) -> Self {
        Self::from_hostname(origin.host(), setting)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn mode(&self) -> HostMode {
        self.mode
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    /// Base URL of the locally proxied API on `local_origin`.
    pub fn api_base(&self, local_origin: &Origin) -> String {
        local_origin.join("api/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_gateway_parsing() {
        for (host, expected) in [
            ("acme.localhost:3000", Some("acme")),
            ("localhost:3000", None),
            ("acme.platform.tld", Some("acme")),
            ("platform.tld", None),
        ] {
            let ctx = TenantContext::from_hostname(host, ModeSetting::Auto);
            let gateway = parse_tenant(host, HostMode::detect(host));
            assert_eq!(ctx.tenant(), gateway.as_ref(), "host {host}");
            assert_eq!(ctx.tenant().map(TenantId::as_str), expected, "host {host}");
        }
    }

    #[test]
    fn api_base_is_local() {
        let origin = Origin::parse("http://acme.localhost:3000").unwrap();
        let ctx = TenantContext::for_origin(&origin, ModeSetting::Auto);
        assert_eq!(ctx.hostname(), "acme.localhost");
        assert_eq!(ctx.mode(), HostMode::Local);
        assert_eq!(ctx.api_base(&origin), "http://acme.localhost:3000/api/");
    }
}
