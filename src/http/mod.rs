//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (lifecycle worker)
//!     → request.rs (add request ID)
//!     → server.rs (trace span, route)
//!     → auth.rs (basic auth, metrics path only)
//!     → metrics handler (registry render)
//! ```

pub mod auth;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, ScrapeState, PROMETHEUS_CONTENT_TYPE};
