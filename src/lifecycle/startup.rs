//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration and parse the connection timeout
//! - Load credentials and scripts
//! - Assemble the metrics registry and construct the exporter
//! - Build both TLS contexts, then bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, ExporterConfig};
use crate::credentials::{load_scripts, split_script_list, CredentialError, CredentialSet, ScriptBundle};
use crate::exporter::{Exporter, ExporterOptions};
use crate::lifecycle::shutdown::{LifecycleError, ServerLifecycle};
use crate::lifecycle::signals::SignalReceiver;
use crate::net::listener::{self, ListenerError};
use crate::net::tls::{check_client_key_pair, TlsError};
use crate::observability::MetricsRegistry;

/// Any failure that keeps the process from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Everything built before the listener starts.
#[derive(Debug)]
pub struct Bootstrap {
    pub exporter: Exporter,
    /// Outbound context handed to the collection engine for `rediss://` backends.
    pub client_tls: rustls::ClientConfig,
    pub lifecycle: ServerLifecycle,
}

/// Build every startup component from the resolved configuration.
///
/// Nothing is served yet; the returned lifecycle holds a bound listener.
pub fn prepare(config: &ExporterConfig) -> Result<Bootstrap, StartupError> {
    validate_config(config).map_err(ConfigError::Validation)?;
    let connection_timeout = config.connection_timeout()?;

    let credentials =
        CredentialSet::resolve(&config.redis.password, &config.redis.password_file)?;
    if !credentials.is_empty() {
        tracing::info!(entries = credentials.len(), "Loaded redis passwords from file");
    }

    let scripts = if config.script_paths.is_empty() {
        ScriptBundle::default()
    } else {
        load_scripts(split_script_list(&config.script_paths))?
    };

    let registry = Arc::new(MetricsRegistry::assemble(
        config.features.redis_only_metrics,
    ));

    let options = ExporterOptions::from_config(
        config,
        connection_timeout,
        credentials,
        scripts,
        registry,
    );
    let exporter = Exporter::new(config.redis.addr.clone(), options);

    check_client_key_pair(&config.client_tls.cert_file, &config.client_tls.key_file)?;
    let client_tls = exporter.create_client_tls_config()?;

    let tls = &config.server_tls;
    let server_tls = exporter.create_server_tls_config(
        &tls.cert_file,
        &tls.key_file,
        &tls.ca_cert_file,
        &tls.min_version,
    )?;

    let socket = listener::bind(&config.web.listen_address)?;
    let lifecycle = ServerLifecycle::new(socket, exporter.router(), server_tls);

    Ok(Bootstrap {
        exporter,
        client_tls,
        lifecycle,
    })
}

/// Prepare, serve, and stop on the first termination signal.
pub async fn serve(config: &ExporterConfig, signals: SignalReceiver) -> Result<(), StartupError> {
    let Bootstrap {
        exporter,
        mut lifecycle,
        ..
    } = prepare(config)?;

    let addr = lifecycle.start().await?;
    tracing::info!(
        address = %addr,
        metrics_path = %exporter.options().metrics_path,
        redis = %exporter.addr(),
        tls = lifecycle.is_tls(),
        "Providing metrics"
    );

    lifecycle.run(signals).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::shutdown::LifecycleState;

    fn local_config() -> ExporterConfig {
        let mut config = ExporterConfig::default();
        config.web.listen_address = "127.0.0.1:0".to_string();
        config
    }

    #[tokio::test]
    async fn prepare_binds_plaintext_listener() {
        let bootstrap = prepare(&local_config()).unwrap();
        assert_eq!(bootstrap.lifecycle.state(), LifecycleState::Initializing);
        assert!(!bootstrap.lifecycle.is_tls());
        assert!(bootstrap.exporter.options().registry.has_process_collectors());
    }

    #[test]
    fn malformed_timeout_aborts() {
        let mut config = local_config();
        config.redis.connection_timeout = "fifteen".to_string();
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Config(ConfigError::ConnectionTimeout { .. }))
        ));
    }

    #[test]
    fn missing_password_file_aborts() {
        let mut config = local_config();
        config.redis.password_file = "/nonexistent/passwords.json".to_string();
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Credentials(CredentialError::ReadPasswordFile { .. }))
        ));
    }

    #[test]
    fn inline_password_skips_password_file() {
        let mut config = local_config();
        config.redis.password = "inline".to_string();
        config.redis.password_file = "/nonexistent/passwords.json".to_string();
        assert!(prepare(&config).is_ok());
    }

    #[test]
    fn unreadable_script_aborts() {
        let mut config = local_config();
        config.script_paths = "/nonexistent/a.lua".to_string();
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Credentials(CredentialError::ReadScript { .. }))
        ));
    }

    #[test]
    fn half_client_pair_aborts() {
        let mut config = local_config();
        config.client_tls.key_file = "/tmp/client.key".to_string();
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Tls(TlsError::MismatchedKeyPair))
        ));
    }

    #[test]
    fn unknown_min_version_aborts() {
        let mut config = local_config();
        config.server_tls.min_version = "TLS2.0".to_string();
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Tls(TlsError::UnknownMinVersion(_)))
        ));
    }

    #[test]
    fn half_basic_auth_is_a_config_error() {
        let mut config = local_config();
        config.web.basic_auth_username = "prom".to_string();
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn colon_metrics_path_is_served_literally() {
        let mut config = local_config();
        config.web.metrics_path = "/:metrics".to_string();
        let bootstrap = prepare(&config).unwrap();
        assert_eq!(bootstrap.exporter.options().metrics_path, "/:metrics");
    }

    #[test]
    fn wildcard_metrics_path_is_served_literally() {
        let mut config = local_config();
        config.web.metrics_path = "/metrics/*".to_string();
        assert!(prepare(&config).is_ok());
    }

    #[test]
    fn brace_metrics_path_is_a_config_error() {
        let mut config = local_config();
        config.web.metrics_path = "/{x}".to_string();
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Config(ConfigError::Validation(_)))
        ));
    }
}
