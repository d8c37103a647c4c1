//! Request forwarding to tenant backends.
//!
//! # Responsibilities
//! - Build the upstream request (target URL, headers, body)
//! - Send it without following redirects
//! - Hand back status, headers and an unbuffered body stream
//!
//! # Design Decisions
//! - No retries: a failed upstream call fails the request with a
//!   [`GatewayError`] (502/504)
//! - The upstream deadline covers connect + response headers only;
//!   streaming bodies are never cut short by it
//! - Dropping the returned body (client went away) drops the upstream
//!   connection, which cancels the fetch

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use reqwest::redirect::Policy;
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::error::GatewayError;
use crate::http::request::{build_upstream_headers, strip_hop_by_hop};
use crate::tenant::Origin;

/// Every forwarded path lives below this prefix on the tenant backend.
pub const UPSTREAM_API_PREFIX: &str = "/api/";

/// An upstream request ready to send.
#[derive(Debug)]
pub struct ForwardedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ForwardedRequest {
    /// Build the upstream request for `path` (the part after the inbound
    /// API prefix) and the raw inbound query string.
    pub fn build(
        method: Method,
        inbound_headers: &HeaderMap,
        body: Bytes,
        origin: &Origin,
        path: &str,
        query: Option<&str>,
    ) -> Result<Self, GatewayError> {
        let mut target = format!("{origin}{UPSTREAM_API_PREFIX}{path}");
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }

        let url = Url::parse(&target)
            .map_err(|e| GatewayError::InvalidTarget(format!("{target}: {e}")))?;
        // Dot segments are resolved during parsing and may climb out of the prefix.
        if !url.path().starts_with(UPSTREAM_API_PREFIX) {
            return Err(GatewayError::InvalidTarget(target));
        }

        let body = if method == Method::GET || method == Method::HEAD {
            None
        } else {
            Some(body)
        };

        Ok(Self {
            method,
            url,
            headers: build_upstream_headers(inbound_headers),
            body,
        })
    }
}

/// Upstream response on its way back to the caller.
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Sends forwarded requests over a shared connection pool.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        })
    }

    /// Send `request` to `origin` and return the response untouched
    /// except for hop-by-hop headers.
    pub async fn send(
        &self,
        request: ForwardedRequest,
        origin: &Origin,
    ) -> Result<ForwardedResponse, GatewayError> {
        let timeout_secs = self.request_timeout.as_secs();
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match tokio::time::timeout(self.request_timeout, builder.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(GatewayError::from_upstream(origin, e, timeout_secs)),
            Err(_) => {
                return Err(GatewayError::Timeout {
                    origin: origin.to_string(),
                    secs: timeout_secs,
                })
            }
        };

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);

        let origin = origin.to_string();
        let stream = response.bytes_stream().inspect_err(move |e| {
            tracing::warn!(origin = %origin, error = %e, "Upstream body stream failed");
        });

        Ok(ForwardedResponse {
            status,
            headers,
            body: Body::from_stream(stream),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{self, HeaderValue};

    fn origin() -> Origin {
        Origin::parse("https://acme.api.platform.tld").unwrap()
    }

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("acme.platform.tld"));
        headers.insert(header::COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers
    }

    #[test]
    fn target_keeps_path_and_query() {
        let req = ForwardedRequest::build(
            Method::GET,
            &inbound(),
            Bytes::new(),
            &origin(),
            "units/42/residents",
            Some("page=2&sort=name"),
        )
        .unwrap();
        assert_eq!(
            req.url.as_str(),
            "https://acme.api.platform.tld/api/units/42/residents?page=2&sort=name"
        );
        assert!(req.headers.get(header::HOST).is_none());
        assert_eq!(req.headers[header::COOKIE], "a=1; b=2");
    }

    #[test]
    fn get_and_head_never_carry_a_body() {
        for method in [Method::GET, Method::HEAD] {
            let req = ForwardedRequest::build(
                method,
                &inbound(),
                Bytes::from_static(b"ignored"),
                &origin(),
                "units",
                None,
            )
            .unwrap();
            assert!(req.body.is_none());
        }
    }

    #[test]
    fn other_methods_pass_raw_bytes() {
        let raw = Bytes::from_static(br#"{ "name" : "Bloco A",  "floors":3 }"#);
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let req = ForwardedRequest::build(
                method,
                &inbound(),
                raw.clone(),
                &origin(),
                "blocks",
                None,
            )
            .unwrap();
            assert_eq!(req.body.as_ref(), Some(&raw));
        }
    }

    #[test]
    fn empty_query_is_dropped() {
        let req =
            ForwardedRequest::build(Method::GET, &inbound(), Bytes::new(), &origin(), "units", Some(""))
                .unwrap();
        assert_eq!(req.url.as_str(), "https://acme.api.platform.tld/api/units");
    }

    #[test]
    fn rejects_paths_escaping_the_prefix() {
        for path in ["../admin", "%2e%2e/admin", "units/../../admin"] {
            let err = ForwardedRequest::build(
                Method::GET,
                &inbound(),
                Bytes::new(),
                &origin(),
                path,
                None,
            )
            .unwrap_err();
            assert!(matches!(err, GatewayError::InvalidTarget(_)), "path {path}");
        }
    }

    #[tokio::test]
    async fn unreachable_origin_is_an_error() {
        let forwarder = Forwarder::new(&TimeoutConfig::default()).unwrap();
        // Port 1 on loopback refuses connections.
        let origin = Origin::parse("http://127.0.0.1:1").unwrap();
        let req = ForwardedRequest::build(Method::GET, &HeaderMap::new(), Bytes::new(), &origin, "x", None)
            .unwrap();
        let err = forwarder.send(req, &origin).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
