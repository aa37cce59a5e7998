//! Configuration validation.
//!
//! # Responsibilities
//! - Cross-field checks the resolver cannot express per option
//! - Shape checks on the HTTP surface (telemetry path, listen address)
//! - Sole owner of the basic-auth pairing and telemetry path rules
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ExporterConfig → Result<(), Vec<ValidationError>>
//! - TLS pairing rules live with the TLS builder, which owns that error type

use std::fmt;

use crate::config::schema::ExporterConfig;

/// A single semantic problem with the resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Only one half of the basic-auth credentials was supplied.
    IncompleteBasicAuth,
    /// Telemetry path must be absolute.
    MetricsPath(String),
    /// Telemetry path contains a route placeholder brace.
    MetricsPathPlaceholder(String),
    /// Listen address is empty.
    EmptyListenAddress,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::IncompleteBasicAuth => {
                write!(f, "basic auth username and password must be supplied together")
            }
            ValidationError::MetricsPath(path) => {
                write!(f, "telemetry path {:?} must start with '/'", path)
            }
            ValidationError::MetricsPathPlaceholder(path) => {
                write!(f, "telemetry path {:?} must not contain '{{' or '}}'", path)
            }
            ValidationError::EmptyListenAddress => write!(f, "listen address must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate the resolved configuration.
pub fn validate_config(config: &ExporterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let has_user = !config.web.basic_auth_username.is_empty();
    let has_password = !config.web.basic_auth_password.is_empty();
    if has_user != has_password {
        errors.push(ValidationError::IncompleteBasicAuth);
    }

    let metrics_path = &config.web.metrics_path;
    if !metrics_path.starts_with('/') {
        errors.push(ValidationError::MetricsPath(metrics_path.clone()));
    }
    // `:` and `*` segments are served literally; braces would become captures.
    if metrics_path.contains(['{', '}']) {
        errors.push(ValidationError::MetricsPathPlaceholder(metrics_path.clone()));
    }

    if config.web.listen_address.trim().is_empty() {
        errors.push(ValidationError::EmptyListenAddress);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
