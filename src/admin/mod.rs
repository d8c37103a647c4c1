//! Operational endpoints served next to the forwarding route.
//!
//! - `GET /healthz`: liveness
//! - `GET /_gateway/tenant`: how the gateway resolves the caller's host

pub mod handlers;
