//! Inbound request handling and upstream header construction.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Parse the inbound cookie jar
//! - Build the header set sent to the tenant backend
//!
//! # Design Decisions
//! - Every inbound header is forwarded except `Host`, `Content-Length`
//!   (the upstream client recomputes framing) and hop-by-hop headers,
//!   including any named in `Connection`
//! - `Cookie` is rebuilt from the parsed jar and omitted when the jar is empty
//! - Cookie names and values are opaque bytes; nothing is decoded

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::Request;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Connection-scoped headers that must not cross the proxy hop.
pub const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Cookies sent by the caller, in header order.
///
/// Names and values are kept as raw bytes: browsers may send obs-text
/// that is not valid UTF-8, and it must reach the backend untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(Vec<u8>, Vec<u8>)>,
}

impl CookieJar {
    /// Parse every `Cookie` header (`name1=value1; name2=value2`).
    ///
    /// Empty segments are skipped. A segment without `=` is kept as a
    /// cookie with an empty value.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let cookies = headers
            .get_all(header::COOKIE)
            .iter()
            .flat_map(|value| value.as_bytes().split(|b| *b == b';'))
            .map(<[u8]>::trim_ascii)
            .filter(|part| !part.is_empty())
            .map(|part| match part.iter().position(|b| *b == b'=') {
                Some(eq) => (
                    part[..eq].trim_ascii().to_vec(),
                    part[eq + 1..].trim_ascii().to_vec(),
                ),
                None => (part.to_vec(), Vec::new()),
            })
            .collect();
        Self { cookies }
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.cookies.iter().map(|(n, v)| (n.as_slice(), v.as_slice()))
    }

    /// Serialize as a single `Cookie` header value, or `None` when empty.
    pub fn to_header_value(&self) -> Option<Result<HeaderValue, InvalidHeaderValue>> {
        if self.cookies.is_empty() {
            return None;
        }
        let mut joined = Vec::new();
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                joined.extend_from_slice(b"; ");
            }
            joined.extend_from_slice(name);
            joined.push(b'=');
            joined.extend_from_slice(value);
        }
        Some(HeaderValue::from_bytes(&joined))
    }
}

impl<N: Into<Vec<u8>>, V: Into<Vec<u8>>> FromIterator<(N, V)> for CookieJar {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            cookies: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Remove connection-scoped headers in place: the fixed hop-by-hop set
/// plus every header named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in HOP_BY_HOP.iter().chain(&listed) {
        headers.remove(name);
    }
}

/// Build the header set forwarded to the tenant backend.
pub fn build_upstream_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    strip_hop_by_hop(&mut headers);

    let jar = CookieJar::from_headers(&headers);
    headers.remove(header::COOKIE);
    match jar.to_header_value() {
        Some(Ok(value)) => {
            headers.insert(header::COOKIE, value);
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, cookies = jar.len(), "Dropping unrepresentable Cookie header");
        }
        None => {}
    }
    headers
}
