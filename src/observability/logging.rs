//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Select text or JSON output from the `log-format` option
//! - Pick the level from the `debug` option unless `RUST_LOG` overrides it

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Default filter directive for the given verbosity.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "redis_exporter=debug,tower_http=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber.
pub fn init_logging(format: LogFormat, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(debug).into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    if debug {
        tracing::debug!("Enabling debug output");
    }
}
