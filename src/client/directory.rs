//! Platform directory of known tenants.
//!
//! A failed lookup never fails the caller: it is logged and degrades to an
//! empty list.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::DirectoryConfig;
use crate::tenant::TenantId;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("directory returned status {0}")]
    Status(StatusCode),
}

/// One directory entry: a bare label or a record naming the subdomain.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectoryEntry {
    Label(String),
    Record {
        #[serde(alias = "slug")]
        subdomain: String,
    },
}

impl DirectoryEntry {
    fn label(&self) -> &str {
        match self {
            DirectoryEntry::Label(label) => label,
            DirectoryEntry::Record { subdomain } => subdomain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TenantDirectory {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl TenantDirectory {
    pub fn new(http: reqwest::Client, config: &DirectoryConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Fetch the known tenants, or an empty list if the lookup fails.
    pub async fn fetch(&self) -> Vec<TenantId> {
        match self.try_fetch().await {
            Ok(tenants) => {
                tracing::debug!(url = %self.url, count = tenants.len(), "Fetched tenant directory");
                tenants
            }
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Tenant directory unavailable");
                Vec::new()
            }
        }
    }

    pub async fn try_fetch(&self) -> Result<Vec<TenantId>, DirectoryError> {
        let response = self.http.get(&self.url).timeout(self.timeout).send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }
        let entries: Vec<DirectoryEntry> = response.json().await?;
        Ok(entries
            .iter()
            .filter_map(|entry| {
                let tenant = TenantId::new(entry.label());
                if tenant.is_none() {
                    tracing::debug!(label = entry.label(), "Skipping invalid directory entry");
                }
                tenant
            })
            .collect())
    }
}
