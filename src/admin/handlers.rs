use axum::{
    body::Body,
    extract::State,
    http::Request,
    Json,
};
use serde::Serialize;

use crate::http::server::{inbound_host, AppState};
use crate::tenant::HostMode;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

/// Tenant resolution for one host.
#[derive(Debug, Serialize)]
pub struct TenantResolution {
    pub host: String,
    pub mode: &'static str,
    pub tenant: Option<String>,
    pub origin: String,
}

pub async fn health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

pub async fn tenant_info(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Json<TenantResolution> {
    let inner = state.inner.load();
    let host = inbound_host(&request).to_string();
    let (mode, tenant) = inner.tenant_for(&host);
    let origin = inner.resolver.resolve(tenant.as_ref());

    Json(TenantResolution {
        mode: match mode {
            HostMode::Local => "local",
            HostMode::Production => "production",
        },
        tenant: tenant.map(|t| t.to_string()),
        origin: origin.to_string(),
        host,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::http::HttpServer;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    async fn get_json(host: &str, uri: &str) -> serde_json::Value {
        let mut config = GatewayConfig::default();
        config.tenancy.backend_domain = "api.platform.tld".into();
        let server = HttpServer::new(config).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::HOST, host)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let body = get_json("platform.tld", "/healthz").await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn tenant_info_for_production_host() {
        let body = get_json("acme.platform.tld", "/_gateway/tenant").await;
        assert_eq!(body["mode"], "production");
        assert_eq!(body["tenant"], "acme");
        assert_eq!(body["origin"], "https://acme.api.platform.tld");
    }

    #[tokio::test]
    async fn tenant_info_for_root_host() {
        let body = get_json("platform.tld", "/_gateway/tenant").await;
        assert!(body["tenant"].is_null());
        assert_eq!(body["origin"], "https://api.platform.tld");
    }
}
