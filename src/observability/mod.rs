//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Scrape requests consume:
//!     → metrics.rs (registry of process/runtime collectors + engine metrics)
//! ```
//!
//! # Design Decisions
//! - Structured logging, text for humans and JSON for machine parsing
//! - The metrics registry is an owned value, not a process-wide global

pub mod logging;
pub mod metrics;

pub use metrics::MetricsRegistry;
