//! Upstream response sanitization.
//!
//! # Responsibilities
//! - Keep session-clearing `Set-Cookie` directives on 4xx away from the browser
//! - Drop a `Content-Encoding` the callers cannot decode
//!
//! # Design Decisions
//! - Only ever removes headers; never adds or rewrites them
//! - Idempotent: a sanitized header set sanitizes to itself
//! - The body is never touched. Removing `Content-Encoding` is only correct
//!   when the body is not actually in that encoding; upstreams are expected
//!   to negotiate encodings the caller accepts.

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;

use crate::config::{CookiePolicy, SanitizerConfig};

/// What a sanitizer pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub removed_set_cookies: usize,
    pub removed_content_encoding: bool,
}

impl SanitizeReport {
    pub fn is_empty(&self) -> bool {
        self.removed_set_cookies == 0 && !self.removed_content_encoding
    }
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    cookie_policy: CookiePolicy,
    unsupported_encodings: Vec<String>,
}

impl Sanitizer {
    pub fn new(config: &SanitizerConfig) -> Self {
        Self {
            cookie_policy: config.cookie_policy,
            unsupported_encodings: config
                .unsupported_encodings
                .iter()
                .map(|e| e.trim().to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Apply both rules to the headers of a response with `status`.
    pub fn sanitize(&self, status: StatusCode, headers: &mut HeaderMap) -> SanitizeReport {
        SanitizeReport {
            removed_set_cookies: self.strip_set_cookie(status, headers),
            removed_content_encoding: self.strip_content_encoding(headers),
        }
    }

    fn strip_set_cookie(&self, status: StatusCode, headers: &mut HeaderMap) -> usize {
        if !status.is_client_error() || !headers.contains_key(header::SET_COOKIE) {
            return 0;
        }
        match self.cookie_policy {
            CookiePolicy::Preserve => 0,
            CookiePolicy::StripAll => {
                let count = headers.get_all(header::SET_COOKIE).iter().count();
                headers.remove(header::SET_COOKIE);
                count
            }
            CookiePolicy::StripClearing => {
                let all: Vec<HeaderValue> = headers.get_all(header::SET_COOKIE).iter().cloned().collect();
                let (cleared, kept): (Vec<_>, Vec<_>) =
                    all.into_iter().partition(|v| is_clearing_directive(v));
                if cleared.is_empty() {
                    return 0;
                }
                headers.remove(header::SET_COOKIE);
                for value in kept {
                    headers.append(header::SET_COOKIE, value);
                }
                cleared.len()
            }
        }
    }

    fn strip_content_encoding(&self, headers: &mut HeaderMap) -> bool {
        let unsupported = headers.get_all(header::CONTENT_ENCODING).iter().any(|value| {
            value.to_str().is_ok_and(|v| {
                v.split(',').any(|token| {
                    let token = token.trim().to_ascii_lowercase();
                    self.unsupported_encodings.iter().any(|u| *u == token)
                })
            })
        });
        if unsupported {
            headers.remove(header::CONTENT_ENCODING);
        }
        unsupported
    }
}

/// True when a `Set-Cookie` value deletes its cookie: empty value,
/// non-positive `Max-Age`, or an `Expires` at the Unix epoch year.
pub fn is_clearing_directive(value: &HeaderValue) -> bool {
    let Ok(raw) = value.to_str() else {
        return false;
    };
    let mut parts = raw.split(';');
    let cookie_value = parts
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, v)| v.trim())
        .unwrap_or("");
    if cookie_value.is_empty() || cookie_value == "\"\"" {
        return true;
    }
    parts.any(|attr| {
        let (name, value) = attr.split_once('=').unwrap_or((attr, ""));
        let name = name.trim();
        if name.eq_ignore_ascii_case("max-age") {
            value.trim().parse::<i64>().is_ok_and(|age| age <= 0)
        } else if name.eq_ignore_ascii_case("expires") {
            value.contains("1970")
        } else {
            false
        }
    })
}
