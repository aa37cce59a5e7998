//! Configuration schema definitions.
//!
//! This module defines the complete resolved configuration for the exporter.
//! The `Default` impls carry the built-in defaults that the resolver falls
//! back to when neither a startup argument nor an environment variable applies.

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::loader::ConfigError;

/// Root configuration for the exporter, built once at startup.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Connection settings for the monitored backend.
    pub redis: RedisConfig,

    /// Metric namespace (prefix).
    pub namespace: String,

    /// Key and stream introspection settings.
    pub keys: KeyCheckConfig,

    /// Comma separated list of Lua script paths.
    pub script_paths: String,

    /// HTTP surface (listen address, telemetry path, basic auth).
    pub web: WebConfig,

    /// Logging settings.
    pub log: LogConfig,

    /// TLS towards the backend.
    pub client_tls: ClientTlsConfig,

    /// TLS for scrape clients.
    pub server_tls: ServerTlsConfig,

    /// Feature toggles forwarded to the collection engine.
    pub features: FeatureConfig,

    /// Print build information and exit.
    pub show_version: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            namespace: "redis".to_string(),
            keys: KeyCheckConfig::default(),
            script_paths: String::new(),
            web: WebConfig::default(),
            log: LogConfig::default(),
            client_tls: ClientTlsConfig::default(),
            server_tls: ServerTlsConfig::default(),
            features: FeatureConfig::default(),
            show_version: false,
        }
    }
}

impl ExporterConfig {
    /// Parse the connection timeout.
    ///
    /// Unlike the generic leniency policy, a malformed timeout is fatal.
    pub fn connection_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.redis.connection_timeout).map_err(|source| {
            ConfigError::ConnectionTimeout {
                value: self.redis.connection_timeout.clone(),
                source,
            }
        })
    }
}

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Backend address (e.g., "redis://localhost:6379").
    pub addr: String,

    /// ACL user name.
    pub user: String,

    /// Inline password; when non-empty the password file is ignored.
    pub password: String,

    /// Path to a JSON file mapping backend addresses to passwords.
    pub password_file: String,

    /// Raw connection timeout, parsed by [`ExporterConfig::connection_timeout`].
    pub connection_timeout: String,

    /// Name of the CONFIG command ("-" skips config metrics).
    pub config_command: String,

    pub set_client_name: bool,
    pub ping_on_connect: bool,
    pub is_tile38: bool,
    pub is_cluster: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: "redis://localhost:6379".to_string(),
            user: String::new(),
            password: String::new(),
            password_file: String::new(),
            connection_timeout: "15s".to_string(),
            config_command: "CONFIG".to_string(),
            set_client_name: true,
            ping_on_connect: false,
            is_tile38: false,
            is_cluster: false,
        }
    }
}

/// Key/stream introspection settings.
#[derive(Debug, Clone)]
pub struct KeyCheckConfig {
    pub check_keys: String,
    pub check_single_keys: String,
    pub check_key_groups: String,
    pub check_streams: String,
    pub check_single_streams: String,
    pub streams_exclude_consumer_metrics: bool,
    pub count_keys: String,

    /// Approximate number of keys processed per SCAN iteration.
    pub check_keys_batch_size: i64,

    /// Distinct key groups kept per database before overflowing.
    pub max_distinct_key_groups: i64,

    pub disable_exporting_key_values: bool,
    pub skip_checkkeys_for_role_master: bool,
}

impl Default for KeyCheckConfig {
    fn default() -> Self {
        Self {
            check_keys: String::new(),
            check_single_keys: String::new(),
            check_key_groups: String::new(),
            check_streams: String::new(),
            check_single_streams: String::new(),
            streams_exclude_consumer_metrics: false,
            count_keys: String::new(),
            check_keys_batch_size: 1000,
            max_distinct_key_groups: 100,
            disable_exporting_key_values: false,
            skip_checkkeys_for_role_master: false,
        }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Listen address (e.g., ":9121" or "127.0.0.1:9121").
    pub listen_address: String,

    /// Path under which metrics are exposed.
    pub metrics_path: String,

    pub basic_auth_username: String,
    pub basic_auth_password: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: ":9121".to_string(),
            metrics_path: "/metrics".to_string(),
            basic_auth_username: String::new(),
            basic_auth_password: String::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Map an option value to a format. Anything but `json` means text.
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,

    /// Verbose debug output.
    pub debug: bool,
}

/// Outbound TLS paths (exporter → backend).
#[derive(Debug, Clone, Default)]
pub struct ClientTlsConfig {
    pub cert_file: String,
    pub key_file: String,
    pub ca_cert_file: String,
    pub skip_verification: bool,
}

/// Inbound TLS paths (scrape client → exporter).
#[derive(Debug, Clone)]
pub struct ServerTlsConfig {
    pub cert_file: String,
    pub key_file: String,

    /// Client CA; when set, scrape clients must present a certificate.
    pub ca_cert_file: String,

    /// Minimum protocol version selector ("TLS1.0" .. "TLS1.3").
    pub min_version: String,
}

impl Default for ServerTlsConfig {
    fn default() -> Self {
        Self {
            cert_file: String::new(),
            key_file: String::new(),
            ca_cert_file: String::new(),
            min_version: "TLS1.2".to_string(),
        }
    }
}

/// Feature toggles consumed by the collection engine.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    pub export_client_list: bool,
    pub export_client_port: bool,

    /// Skip process and runtime collectors.
    pub redis_only_metrics: bool,

    pub incl_config_metrics: bool,
    pub incl_modules_metrics: bool,
    pub incl_system_metrics: bool,
    pub exclude_latency_histogram_metrics: bool,
    pub redact_config_metrics: bool,
    pub incl_metrics_for_empty_databases: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            export_client_list: false,
            export_client_port: false,
            redis_only_metrics: false,
            incl_config_metrics: false,
            incl_modules_metrics: false,
            incl_system_metrics: false,
            exclude_latency_histogram_metrics: false,
            redact_config_metrics: true,
            incl_metrics_for_empty_databases: true,
        }
    }
}
