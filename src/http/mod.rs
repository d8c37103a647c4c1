//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → tenant resolution (host → tenant → origin)
//!     → request.rs (cookie jar, upstream headers)
//!     → forward.rs (upstream call, no redirects, streamed body)
//!     → response.rs (sanitize Set-Cookie / Content-Encoding)
//!     → Send to client
//!
//! Any failure along the way → error.rs (structured 4xx/5xx)
//! ```

pub mod error;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use error::GatewayError;
pub use forward::{ForwardedRequest, ForwardedResponse, Forwarder};
pub use request::{CookieJar, UuidRequestId, X_REQUEST_ID};
pub use response::{SanitizeReport, Sanitizer};
pub use server::{HttpServer, ServerError};
