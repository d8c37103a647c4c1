//! Gateway failure contract.
//!
//! Every failure the forwarding path can hit is a [`GatewayError`] and is
//! rendered as a JSON body with a 4xx/5xx status, so callers can always
//! tell a transport failure from a legitimate empty response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::tenant::Origin;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("origin {origin} is unreachable: {source}")]
    UnreachableOrigin {
        origin: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("origin {origin} did not respond within {secs}s")]
    Timeout { origin: String, secs: u64 },

    #[error("malformed response from {origin}: {reason}")]
    MalformedUpstreamResponse { origin: String, reason: String },

    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    InboundBody(String),
}

impl GatewayError {
    /// Classify a client error raised while talking to `origin`.
    pub fn from_upstream(origin: &Origin, err: reqwest::Error, timeout_secs: u64) -> Self {
        let origin = origin.to_string();
        if err.is_timeout() {
            GatewayError::Timeout {
                origin,
                secs: timeout_secs,
            }
        } else if err.is_decode() || err.is_body() || err.is_redirect() {
            GatewayError::MalformedUpstreamResponse {
                origin,
                reason: err.to_string(),
            }
        } else {
            GatewayError::UnreachableOrigin {
                origin,
                source: err,
            }
        }
    }

    /// Short machine-readable kind, used in bodies and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::UnreachableOrigin { .. } => "unreachable_origin",
            GatewayError::Timeout { .. } => "upstream_timeout",
            GatewayError::MalformedUpstreamResponse { .. } => "malformed_upstream_response",
            GatewayError::InvalidTarget(_) => "invalid_target",
            GatewayError::BodyTooLarge { .. } => "body_too_large",
            GatewayError::InboundBody(_) => "invalid_request_body",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UnreachableOrigin { .. }
            | GatewayError::MalformedUpstreamResponse { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::InvalidTarget(_) | GatewayError::InboundBody(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        let timeout = GatewayError::Timeout {
            origin: "https://acme.example".into(),
            secs: 30,
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.kind(), "upstream_timeout");

        let malformed = GatewayError::MalformedUpstreamResponse {
            origin: "https://acme.example".into(),
            reason: "bad chunk".into(),
        };
        assert_eq!(malformed.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            GatewayError::BodyTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn renders_json_body() {
        let response = GatewayError::InvalidTarget("/api/../admin".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_target");
    }
}
