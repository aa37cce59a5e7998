//! Prometheus exporter for Redis: bootstrap and lifecycle.

pub mod config;
pub mod credentials;
pub mod exporter;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ExporterConfig;
pub use exporter::{Exporter, ExporterOptions};
pub use lifecycle::{ServerLifecycle, StartupError};
