//! Tenant resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Host header / location.hostname
//!     → host.rs (strip port, split labels, pick tenant label)
//!     → Option<TenantId>
//!     → origin.rs (template or pinned origin lookup)
//!     → Origin
//! ```
//!
//! # Design Decisions
//! - Both steps are pure and total: no I/O, no errors
//! - Recomputed per request, never cached
//! - The same parser serves the gateway and the API client context

pub mod host;
pub mod origin;

pub use host::{parse_tenant, strip_port, HostMode, TenantId};
pub use origin::{Origin, OriginResolver};
