//! API client side of tenant resolution.
//!
//! # Data Flow
//! ```text
//! Application start
//!     → context.rs (hostname → TenantContext, computed once)
//!     → registry.rs (Origin → immutable ApiClient, shared by all callers)
//!     → calls go to <origin>/api/..., i.e. through the gateway
//!
//! Background
//!     → directory.rs (known tenants, empty list on any failure)
//! ```
//!
//! # Design Decisions
//! - No process-wide mutable client: each origin gets its own immutable
//!   descriptor, so concurrent calls for different tenants cannot observe
//!   each other's base URL
//! - Tenant parsing is the same function the gateway uses

pub mod context;
pub mod directory;
pub mod registry;

pub use context::TenantContext;
pub use directory::{DirectoryError, TenantDirectory};
pub use registry::{ApiClient, ClientRegistry};
