//! Tenant-resolving request gateway.
//!
//! Each tenant ("condominio") is served under its own subdomain. The gateway
//! takes every call made to the local `/api/...` endpoint, works out the
//! tenant from the `Host` header, and relays the call to that tenant's
//! backend origin, cleaning up response headers on the way back.
//!
//! ```text
//! browser ──▶ /api/{*path} ──▶ tenant::host ──▶ tenant::origin ──▶ http::forward ──▶ backend
//!    ◀──────────────────────────── http::response (sanitize) ◀────────────────────────┘
//! ```

pub mod admin;
pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod tenant;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
