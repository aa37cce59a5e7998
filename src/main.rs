//! Redis Metrics Exporter
//!
//! # Architecture Overview
//!
//! ```text
//!   args + env ──▶ config ──▶ credentials ──▶ exporter ──▶ lifecycle
//!                    │                          │  ▲          │
//!                    ▼                          ▼  │          ▼
//!               observability               net::tls    net::listener
//!              (logging, registry)                      + http router
//! ```

use std::process::ExitCode;

use clap::Parser;

use redis_exporter::config::{resolve_config, Cli, ProcessEnvironment};
use redis_exporter::exporter::BuildInfo;
use redis_exporter::lifecycle::{listen_for_termination, serve};
use redis_exporter::observability::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let resolved = resolve_config(Cli::parse(), &ProcessEnvironment);
    let config = resolved.config;

    let build = BuildInfo::current();
    if config.show_version {
        println!("{build}");
        return ExitCode::SUCCESS;
    }

    init_logging(config.log.format, config.log.debug);
    for fallback in &resolved.fallbacks {
        tracing::warn!(
            variable = fallback.variable,
            value = %fallback.value,
            default = %fallback.default,
            "Ignoring unparsable environment value, using default"
        );
    }
    tracing::info!("{build}");

    let signals = match listen_for_termination() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return ExitCode::FAILURE;
        }
    };

    match serve(&config, signals).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
