//! Exporter construction options.

use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::{FeatureConfig, KeyCheckConfig};
use crate::config::{ClientTlsConfig, ExporterConfig};
use crate::credentials::{CredentialSet, ScriptBundle};
use crate::observability::MetricsRegistry;

const UNSET_BUILD_FIELD: &str = "<<< filled in by build >>>";

/// Build metadata reported by `--version` and the build info gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub commit_sha: String,
    pub date: String,
}

impl BuildInfo {
    /// Metadata baked in at compile time.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit_sha: option_env!("REDIS_EXPORTER_BUILD_COMMIT_SHA")
                .unwrap_or(UNSET_BUILD_FIELD)
                .to_string(),
            date: option_env!("REDIS_EXPORTER_BUILD_DATE")
                .unwrap_or(UNSET_BUILD_FIELD)
                .to_string(),
        }
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Redis Metrics Exporter {}    build date: {}    sha1: {}    OS/ARCH: {}/{}",
            self.version,
            self.date,
            self.commit_sha,
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }
}

/// Username/password pair gating the metrics path.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    /// `None` when neither half is configured.
    pub fn from_pair(username: &str, password: &str) -> Option<Self> {
        if username.is_empty() && password.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the exporter needs, assembled once at startup.
///
/// Owned exclusively by the [`Exporter`](super::Exporter) it configures.
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    pub user: String,
    pub password: String,
    pub credentials: CredentialSet,
    pub namespace: String,
    pub config_command: String,
    pub connection_timeout: Duration,
    pub keys: KeyCheckConfig,
    pub scripts: ScriptBundle,
    pub client_tls: ClientTlsConfig,
    pub features: FeatureConfig,
    pub set_client_name: bool,
    pub ping_on_connect: bool,
    pub is_tile38: bool,
    pub is_cluster: bool,
    pub metrics_path: String,
    pub basic_auth: Option<BasicAuth>,
    pub build_info: BuildInfo,
    pub registry: Arc<MetricsRegistry>,
}

impl ExporterOptions {
    /// Combine the resolved configuration with loaded material.
    pub fn from_config(
        config: &ExporterConfig,
        connection_timeout: Duration,
        credentials: CredentialSet,
        scripts: ScriptBundle,
        registry: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            user: config.redis.user.clone(),
            password: config.redis.password.clone(),
            credentials,
            namespace: config.namespace.clone(),
            config_command: config.redis.config_command.clone(),
            connection_timeout,
            keys: config.keys.clone(),
            scripts,
            client_tls: config.client_tls.clone(),
            features: config.features.clone(),
            set_client_name: config.redis.set_client_name,
            ping_on_connect: config.redis.ping_on_connect,
            is_tile38: config.redis.is_tile38,
            is_cluster: config.redis.is_cluster,
            metrics_path: config.web.metrics_path.clone(),
            basic_auth: BasicAuth::from_pair(
                &config.web.basic_auth_username,
                &config.web.basic_auth_password,
            ),
            build_info: BuildInfo::current(),
            registry,
        }
    }
}
