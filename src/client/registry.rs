//! Tenant-keyed registry of immutable API clients.

use std::sync::Arc;

use dashmap::DashMap;
use reqwest::{Method, RequestBuilder};

use crate::client::context::TenantContext;
use crate::config::ModeSetting;
use crate::tenant::{Origin, TenantId};

/// Immutable client descriptor for one origin.
#[derive(Debug)]
pub struct ApiClient {
    origin: Origin,
    context: TenantContext,
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    fn new(origin: Origin, setting: ModeSetting, http: reqwest::Client) -> Self {
        let context = TenantContext::for_origin(&origin, setting);
        let base_url = context.api_base(&origin);
        Self {
            origin,
            context,
            base_url,
            http,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        self.context.tenant()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }
}

/// Hands out one shared [`ApiClient`] per origin.
///
/// Entries are created on first use and never modified afterwards.
#[derive(Debug)]
pub struct ClientRegistry {
    http: reqwest::Client,
    setting: ModeSetting,
    clients: DashMap<Origin, Arc<ApiClient>>,
}

impl ClientRegistry {
    pub fn new(http: reqwest::Client, setting: ModeSetting) -> Self {
        Self {
            http,
            setting,
            clients: DashMap::new(),
        }
    }

    pub fn client_for(&self, origin: &Origin) -> Arc<ApiClient> {
        if let Some(existing) = self.clients.get(origin) {
            return Arc::clone(existing.value());
        }
        let entry = self.clients.entry(origin.clone()).or_insert_with(|| {
            tracing::debug!(origin = %origin, "Creating API client");
            Arc::new(ApiClient::new(origin.clone(), self.setting, self.http.clone()))
        });
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<ClientRegistry> {
        Arc::new(ClientRegistry::new(reqwest::Client::new(), ModeSetting::Auto))
    }

    #[test]
    fn same_origin_shares_one_client() {
        let registry = registry();
        let origin = Origin::parse("http://acme.localhost:3000").unwrap();
        let a = registry.client_for(&origin);
        let b = registry.client_for(&origin);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.tenant().map(TenantId::as_str), Some("acme"));
        assert_eq!(a.url("/units"), "http://acme.localhost:3000/api/units");
    }

    #[test]
    fn clients_for_other_origins_are_untouched() {
        let registry = registry();
        let acme = registry.client_for(&Origin::parse("https://acme.platform.tld").unwrap());
        let beta = registry.client_for(&Origin::parse("https://beta.platform.tld").unwrap());

        assert_eq!(acme.base_url(), "https://acme.platform.tld/api/");
        assert_eq!(beta.base_url(), "https://beta.platform.tld/api/");
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tenants_never_see_each_others_base_url() {
        let registry = registry();
        let mut tasks = Vec::new();
        for i in 0..200 {
            let registry = Arc::clone(&registry);
            let tenant = if i % 2 == 0 { "acme" } else { "beta" };
            tasks.push(tokio::spawn(async move {
                let origin = Origin::parse(&format!("https://{tenant}.platform.tld")).unwrap();
                let client = registry.client_for(&origin);
                tokio::task::yield_now().await;
                (tenant, client.url("units"))
            }));
        }
        for task in tasks {
            let (tenant, url) = task.await.unwrap();
            assert_eq!(url, format!("https://{tenant}.platform.tld/api/units"));
        }
        assert_eq!(registry.len(), 2);
    }
}
