//! Host name parsing.
//!
//! # Responsibilities
//! - Drop the port from a `Host` authority
//! - Decide local vs production parsing
//! - Extract the tenant label, if any
//!
//! # Design Decisions
//! - Malformed input yields no tenant instead of an error
//! - Labels are compared and returned lowercase (host names are case-insensitive)

use std::fmt;
use std::net::Ipv4Addr;

use crate::config::ModeSetting;

const LOCALHOST: &str = "localhost";

/// Identifier of one tenant: the first label of its host name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(String);

impl TenantId {
    /// Build a tenant id from a single host label.
    pub fn new(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let valid = !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then_some(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host parsing regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    /// Development hosts of the form `<tenant>.localhost`.
    Local,
    /// Public hosts of the form `<tenant>.<platform>.<tld>`.
    Production,
}

impl HostMode {
    /// Pick the mode for a host name: loopback names are local.
    pub fn detect(hostname: &str) -> Self {
        let host = strip_port(hostname).to_ascii_lowercase();
        if host == LOCALHOST || host.ends_with(".localhost") {
            HostMode::Local
        } else {
            HostMode::Production
        }
    }

    /// Resolve a configured mode setting for a given host.
    pub fn for_host(setting: ModeSetting, hostname: &str) -> Self {
        match setting {
            ModeSetting::Auto => Self::detect(hostname),
            ModeSetting::Local => HostMode::Local,
            ModeSetting::Production => HostMode::Production,
        }
    }
}

/// Return the host part of an authority (`host[:port]`).
///
/// Bracketed IPv6 literals keep their brackets so that they never look
/// like a dotted name.
pub fn strip_port(authority: &str) -> &str {
    let authority = authority.trim();
    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

/// Derive the tenant from a host name.
///
/// The port, if any, is ignored. Returns `None` for the platform/root
/// host and for anything malformed.
pub fn parse_tenant(hostname: &str, mode: HostMode) -> Option<TenantId> {
    let host = strip_port(hostname).trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() || host.starts_with('[') || host.parse::<Ipv4Addr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.iter().any(|label| label.is_empty()) {
        return None;
    }

    let first = labels[0];
    let is_tenant = match mode {
        HostMode::Local => {
            labels.len() >= 2 && labels[labels.len() - 1] == LOCALHOST && first != LOCALHOST
        }
        HostMode::Production => labels.len() > 2,
    };

    // The label ends up inside a URL authority, so it must be a plain label.
    if is_tenant {
        TenantId::new(first)
    } else {
        None
    }
}
