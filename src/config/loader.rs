//! Option resolution from startup arguments and the environment.
//!
//! Precedence per option: explicit argument, then environment variable, then
//! the default from `schema.rs`. An environment value that does not parse for
//! the option's type is discarded in favour of the default and recorded as an
//! [`EnvFallback`]; it never aborts startup.

use std::collections::HashMap;
use std::ffi::OsString;

use thiserror::Error;

use crate::config::cli::Cli;
use crate::config::duration::DurationError;
use crate::config::schema::{
    ClientTlsConfig, ExporterConfig, FeatureConfig, KeyCheckConfig, LogConfig, LogFormat,
    RedisConfig, ServerTlsConfig, WebConfig,
};
use crate::config::validation::ValidationError;

/// Error type for configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't parse connection timeout duration {value:?}: {source}")]
    ConnectionTimeout {
        value: String,
        #[source]
        source: DurationError,
    },

    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of environment variables.
///
/// Values are raw OS strings; one that is not valid UTF-8 is treated like any
/// other unparsable value.
pub trait Environment {
    fn lookup(&self, key: &str) -> Option<OsString>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn lookup(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

impl Environment for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<OsString> {
        self.get(key).map(OsString::from)
    }
}

impl Environment for HashMap<String, OsString> {
    fn lookup(&self, key: &str) -> Option<OsString> {
        self.get(key).cloned()
    }
}

/// An environment value that was ignored because it did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFallback {
    pub variable: &'static str,
    pub value: String,
    pub default: String,
}

/// A value type an option can hold.
pub trait OptionValue: Sized + ToString {
    /// Strict parse; `None` means the raw value is not valid for the type.
    fn parse_strict(raw: &str) -> Option<Self>;
}

impl OptionValue for String {
    fn parse_strict(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl OptionValue for bool {
    fn parse_strict(raw: &str) -> Option<Self> {
        parse_bool(raw)
    }
}

impl OptionValue for i64 {
    fn parse_strict(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Boolean grammar shared by arguments and environment values.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Resolves options against one environment, collecting ignored values.
pub struct Resolver<'a> {
    env: &'a dyn Environment,
    fallbacks: Vec<EnvFallback>,
}

impl<'a> Resolver<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self {
            env,
            fallbacks: Vec::new(),
        }
    }

    /// Resolve a single option.
    pub fn resolve<T: OptionValue>(
        &mut self,
        arg: Option<T>,
        variable: &'static str,
        default: T,
    ) -> T {
        if let Some(value) = arg {
            return value;
        }
        let Some(raw) = self.env.lookup(variable) else {
            return default;
        };
        let parsed = raw.to_str().and_then(T::parse_strict);
        match parsed {
            Some(value) => value,
            None => {
                self.fallbacks.push(EnvFallback {
                    variable,
                    value: raw.to_string_lossy().into_owned(),
                    default: default.to_string(),
                });
                default
            }
        }
    }

    /// Environment values discarded so far.
    pub fn into_fallbacks(self) -> Vec<EnvFallback> {
        self.fallbacks
    }
}

/// Resolved configuration plus the environment values that were ignored.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: ExporterConfig,
    pub fallbacks: Vec<EnvFallback>,
}

/// Build the immutable configuration from startup arguments and environment.
pub fn resolve_config(cli: Cli, env: &dyn Environment) -> Resolved {
    let defaults = ExporterConfig::default();
    let mut r = Resolver::new(env);

    let redis = RedisConfig {
        addr: r.resolve(cli.redis_addr, "REDIS_ADDR", defaults.redis.addr),
        user: r.resolve(cli.redis_user, "REDIS_USER", defaults.redis.user),
        password: r.resolve(cli.redis_password, "REDIS_PASSWORD", defaults.redis.password),
        password_file: r.resolve(
            cli.redis_password_file,
            "REDIS_PASSWORD_FILE",
            defaults.redis.password_file,
        ),
        connection_timeout: r.resolve(
            cli.connection_timeout,
            "REDIS_EXPORTER_CONNECTION_TIMEOUT",
            defaults.redis.connection_timeout,
        ),
        config_command: r.resolve(
            cli.config_command,
            "REDIS_EXPORTER_CONFIG_COMMAND",
            defaults.redis.config_command,
        ),
        set_client_name: r.resolve(
            cli.set_client_name,
            "REDIS_EXPORTER_SET_CLIENT_NAME",
            defaults.redis.set_client_name,
        ),
        ping_on_connect: r.resolve(
            cli.ping_on_connect,
            "REDIS_EXPORTER_PING_ON_CONNECT",
            defaults.redis.ping_on_connect,
        ),
        is_tile38: r.resolve(cli.is_tile38, "REDIS_EXPORTER_IS_TILE38", defaults.redis.is_tile38),
        is_cluster: r.resolve(cli.is_cluster, "REDIS_EXPORTER_IS_CLUSTER", defaults.redis.is_cluster),
    };

    let namespace = r.resolve(cli.namespace, "REDIS_EXPORTER_NAMESPACE", defaults.namespace);

    let keys = KeyCheckConfig {
        check_keys: r.resolve(cli.check_keys, "REDIS_EXPORTER_CHECK_KEYS", defaults.keys.check_keys),
        check_single_keys: r.resolve(
            cli.check_single_keys,
            "REDIS_EXPORTER_CHECK_SINGLE_KEYS",
            defaults.keys.check_single_keys,
        ),
        check_key_groups: r.resolve(
            cli.check_key_groups,
            "REDIS_EXPORTER_CHECK_KEY_GROUPS",
            defaults.keys.check_key_groups,
        ),
        check_streams: r.resolve(
            cli.check_streams,
            "REDIS_EXPORTER_CHECK_STREAMS",
            defaults.keys.check_streams,
        ),
        check_single_streams: r.resolve(
            cli.check_single_streams,
            "REDIS_EXPORTER_CHECK_SINGLE_STREAMS",
            defaults.keys.check_single_streams,
        ),
        streams_exclude_consumer_metrics: r.resolve(
            cli.streams_exclude_consumer_metrics,
            "REDIS_EXPORTER_STREAMS_EXCLUDE_CONSUMER_METRICS",
            defaults.keys.streams_exclude_consumer_metrics,
        ),
        count_keys: r.resolve(cli.count_keys, "REDIS_EXPORTER_COUNT_KEYS", defaults.keys.count_keys),
        check_keys_batch_size: r.resolve(
            cli.check_keys_batch_size,
            "REDIS_EXPORTER_CHECK_KEYS_BATCH_SIZE",
            defaults.keys.check_keys_batch_size,
        ),
        max_distinct_key_groups: r.resolve(
            cli.max_distinct_key_groups,
            "REDIS_EXPORTER_MAX_DISTINCT_KEY_GROUPS",
            defaults.keys.max_distinct_key_groups,
        ),
        disable_exporting_key_values: r.resolve(
            cli.disable_exporting_key_values,
            "REDIS_EXPORTER_DISABLE_EXPORTING_KEY_VALUES",
            defaults.keys.disable_exporting_key_values,
        ),
        skip_checkkeys_for_role_master: r.resolve(
            cli.skip_checkkeys_for_role_master,
            "REDIS_EXPORTER_SKIP_CHECKKEYS_FOR_ROLE_MASTER",
            defaults.keys.skip_checkkeys_for_role_master,
        ),
    };

    let script_paths = r.resolve(cli.script, "REDIS_EXPORTER_SCRIPT", defaults.script_paths);

    let web = WebConfig {
        listen_address: r.resolve(
            cli.listen_address,
            "REDIS_EXPORTER_WEB_LISTEN_ADDRESS",
            defaults.web.listen_address,
        ),
        metrics_path: r.resolve(
            cli.metrics_path,
            "REDIS_EXPORTER_WEB_TELEMETRY_PATH",
            defaults.web.metrics_path,
        ),
        basic_auth_username: r.resolve(
            cli.basic_auth_username,
            "REDIS_EXPORTER_BASIC_AUTH_USERNAME",
            defaults.web.basic_auth_username,
        ),
        basic_auth_password: r.resolve(
            cli.basic_auth_password,
            "REDIS_EXPORTER_BASIC_AUTH_PASSWORD",
            defaults.web.basic_auth_password,
        ),
    };

    let log = LogConfig {
        format: LogFormat::from_name(&r.resolve(
            cli.log_format,
            "REDIS_EXPORTER_LOG_FORMAT",
            "txt".to_string(),
        )),
        debug: r.resolve(cli.debug, "REDIS_EXPORTER_DEBUG", defaults.log.debug),
    };

    let client_tls = ClientTlsConfig {
        cert_file: r.resolve(
            cli.tls_client_cert_file,
            "REDIS_EXPORTER_TLS_CLIENT_CERT_FILE",
            defaults.client_tls.cert_file,
        ),
        key_file: r.resolve(
            cli.tls_client_key_file,
            "REDIS_EXPORTER_TLS_CLIENT_KEY_FILE",
            defaults.client_tls.key_file,
        ),
        ca_cert_file: r.resolve(
            cli.tls_ca_cert_file,
            "REDIS_EXPORTER_TLS_CA_CERT_FILE",
            defaults.client_tls.ca_cert_file,
        ),
        skip_verification: r.resolve(
            cli.skip_tls_verification,
            "REDIS_EXPORTER_SKIP_TLS_VERIFICATION",
            defaults.client_tls.skip_verification,
        ),
    };

    let server_tls = ServerTlsConfig {
        cert_file: r.resolve(
            cli.tls_server_cert_file,
            "REDIS_EXPORTER_TLS_SERVER_CERT_FILE",
            defaults.server_tls.cert_file,
        ),
        key_file: r.resolve(
            cli.tls_server_key_file,
            "REDIS_EXPORTER_TLS_SERVER_KEY_FILE",
            defaults.server_tls.key_file,
        ),
        ca_cert_file: r.resolve(
            cli.tls_server_ca_cert_file,
            "REDIS_EXPORTER_TLS_SERVER_CA_CERT_FILE",
            defaults.server_tls.ca_cert_file,
        ),
        min_version: r.resolve(
            cli.tls_server_min_version,
            "REDIS_EXPORTER_TLS_SERVER_MIN_VERSION",
            defaults.server_tls.min_version,
        ),
    };

    let features = FeatureConfig {
        export_client_list: r.resolve(
            cli.export_client_list,
            "REDIS_EXPORTER_EXPORT_CLIENT_LIST",
            defaults.features.export_client_list,
        ),
        export_client_port: r.resolve(
            cli.export_client_port,
            "REDIS_EXPORTER_EXPORT_CLIENT_PORT",
            defaults.features.export_client_port,
        ),
        redis_only_metrics: r.resolve(
            cli.redis_only_metrics,
            "REDIS_EXPORTER_REDIS_ONLY_METRICS",
            defaults.features.redis_only_metrics,
        ),
        incl_config_metrics: r.resolve(
            cli.include_config_metrics,
            "REDIS_EXPORTER_INCL_CONFIG_METRICS",
            defaults.features.incl_config_metrics,
        ),
        incl_modules_metrics: r.resolve(
            cli.include_modules_metrics,
            "REDIS_EXPORTER_INCL_MODULES_METRICS",
            defaults.features.incl_modules_metrics,
        ),
        incl_system_metrics: r.resolve(
            cli.include_system_metrics,
            "REDIS_EXPORTER_INCL_SYSTEM_METRICS",
            defaults.features.incl_system_metrics,
        ),
        exclude_latency_histogram_metrics: r.resolve(
            cli.exclude_latency_histogram_metrics,
            "REDIS_EXPORTER_EXCLUDE_LATENCY_HISTOGRAM_METRICS",
            defaults.features.exclude_latency_histogram_metrics,
        ),
        redact_config_metrics: r.resolve(
            cli.redact_config_metrics,
            "REDIS_EXPORTER_REDACT_CONFIG_METRICS",
            defaults.features.redact_config_metrics,
        ),
        incl_metrics_for_empty_databases: r.resolve(
            cli.include_metrics_for_empty_databases,
            "REDIS_EXPORTER_INCL_METRICS_FOR_EMPTY_DATABASES",
            defaults.features.incl_metrics_for_empty_databases,
        ),
    };

    let config = ExporterConfig {
        redis,
        namespace,
        keys,
        script_paths,
        web,
        log,
        client_tls,
        server_tls,
        features,
        show_version: cli.version,
    };

    Resolved {
        config,
        fallbacks: r.into_fallbacks(),
    }
}
