//! Startup arguments.
//!
//! Every option is optional here: clap only records what was explicitly
//! supplied. Environment fallback and defaults are applied by the resolver in
//! `loader.rs`, which keeps precedence and the leniency policy in one place.

use clap::Parser;

/// Parse a boolean flag value in the strict `strconv` grammar.
fn parse_flag_bool(raw: &str) -> Result<bool, String> {
    crate::config::loader::parse_bool(raw)
        .ok_or_else(|| format!("invalid boolean value {raw:?}"))
}

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "redis_exporter")]
#[command(about = "Prometheus exporter for Redis metrics", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Address of the Redis instance to scrape
    #[arg(long = "redis.addr")]
    pub redis_addr: Option<String>,

    /// User name to use for authentication (Redis ACL for Redis 6.0 and newer)
    #[arg(long = "redis.user")]
    pub redis_user: Option<String>,

    /// Password of the Redis instance to scrape
    #[arg(long = "redis.password")]
    pub redis_password: Option<String>,

    /// Password file of the Redis instance to scrape
    #[arg(long = "redis.password-file")]
    pub redis_password_file: Option<String>,

    /// Namespace for metrics
    #[arg(long)]
    pub namespace: Option<String>,

    /// Comma separated list of key-patterns to export value and length/size, searched for with SCAN
    #[arg(long = "check-keys")]
    pub check_keys: Option<String>,

    /// Comma separated list of single keys to export value and length/size
    #[arg(long = "check-single-keys")]
    pub check_single_keys: Option<String>,

    /// Comma separated list of lua regex for grouping keys
    #[arg(long = "check-key-groups")]
    pub check_key_groups: Option<String>,

    /// Comma separated list of stream-patterns to export info about streams, groups and consumers
    #[arg(long = "check-streams")]
    pub check_streams: Option<String>,

    /// Comma separated list of single streams to export info about streams, groups and consumers
    #[arg(long = "check-single-streams")]
    pub check_single_streams: Option<String>,

    /// Don't collect per consumer metrics for streams (decreases cardinality)
    #[arg(long = "streams-exclude-consumer-metrics", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub streams_exclude_consumer_metrics: Option<bool>,

    /// Comma separated list of patterns to count (eg: 'db0=production_*,db3=sessions:*')
    #[arg(long = "count-keys")]
    pub count_keys: Option<String>,

    /// Approximate number of keys to process in each execution
    #[arg(long = "check-keys-batch-size")]
    pub check_keys_batch_size: Option<i64>,

    /// Comma separated list of path(s) to Redis Lua script(s) for gathering extra metrics
    #[arg(long)]
    pub script: Option<String>,

    /// Address to listen on for web interface and telemetry
    #[arg(long = "web.listen-address")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path")]
    pub metrics_path: Option<String>,

    /// Log format, valid options are txt and json
    #[arg(long = "log-format")]
    pub log_format: Option<String>,

    /// What to use for the CONFIG command, set to "-" to skip config metrics extraction
    #[arg(long = "config-command")]
    pub config_command: Option<String>,

    /// Timeout for connection to Redis instance
    #[arg(long = "connection-timeout")]
    pub connection_timeout: Option<String>,

    /// Client key file if the server requires TLS client authentication
    #[arg(long = "tls-client-key-file")]
    pub tls_client_key_file: Option<String>,

    /// Client certificate file if the server requires TLS client authentication
    #[arg(long = "tls-client-cert-file")]
    pub tls_client_cert_file: Option<String>,

    /// CA certificate file used to verify the Redis server
    #[arg(long = "tls-ca-cert-file")]
    pub tls_ca_cert_file: Option<String>,

    /// Server key file if the web interface and telemetry should use TLS
    #[arg(long = "tls-server-key-file")]
    pub tls_server_key_file: Option<String>,

    /// Server certificate file if the web interface and telemetry should use TLS
    #[arg(long = "tls-server-cert-file")]
    pub tls_server_cert_file: Option<String>,

    /// CA certificate file if the web interface and telemetry should require TLS client authentication
    #[arg(long = "tls-server-ca-cert-file")]
    pub tls_server_ca_cert_file: Option<String>,

    /// Minimum TLS version acceptable by the web interface and telemetry
    #[arg(long = "tls-server-min-version")]
    pub tls_server_min_version: Option<String>,

    /// Maximum number of distinct key groups per database before overflow aggregation
    #[arg(long = "max-distinct-key-groups")]
    pub max_distinct_key_groups: Option<i64>,

    /// Output verbose debug information
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub debug: Option<bool>,

    /// Whether to set client name to redis_exporter
    #[arg(long = "set-client-name", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub set_client_name: Option<bool>,

    /// Whether to scrape Tile38 specific metrics
    #[arg(long = "is-tile38", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub is_tile38: Option<bool>,

    /// Whether this is a redis cluster
    #[arg(long = "is-cluster", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub is_cluster: Option<bool>,

    /// Whether to scrape Client List specific metrics
    #[arg(long = "export-client-list", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub export_client_list: Option<bool>,

    /// Whether to include the client's port when exporting the client list
    #[arg(long = "export-client-port", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub export_client_port: Option<bool>,

    /// Show version information and exit
    #[arg(long)]
    pub version: bool,

    /// Whether to only export Redis metrics (no process/runtime metrics)
    #[arg(long = "redis-only-metrics", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub redis_only_metrics: Option<bool>,

    /// Whether to ping the redis instance after connecting
    #[arg(long = "ping-on-connect", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub ping_on_connect: Option<bool>,

    /// Whether to include all config settings as metrics
    #[arg(long = "include-config-metrics", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub include_config_metrics: Option<bool>,

    /// Whether to collect Redis Modules metrics
    #[arg(long = "include-modules-metrics", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub include_modules_metrics: Option<bool>,

    /// Whether to disable values of keys stored in redis as labels
    #[arg(long = "disable-exporting-key-values", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub disable_exporting_key_values: Option<bool>,

    /// Do not try to collect latency histogram metrics
    #[arg(long = "exclude-latency-histogram-metrics", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub exclude_latency_histogram_metrics: Option<bool>,

    /// Whether to redact config settings that include potentially sensitive information
    #[arg(long = "redact-config-metrics", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub redact_config_metrics: Option<bool>,

    /// Whether to include system metrics like e.g. redis_total_system_memory_bytes
    #[arg(long = "include-system-metrics", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub include_system_metrics: Option<bool>,

    /// Whether to skip TLS verification
    #[arg(long = "skip-tls-verification", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub skip_tls_verification: Option<bool>,

    /// Whether to skip gathering the check-keys metrics when the instance is a master
    #[arg(long = "skip-checkkeys-for-role-master", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub skip_checkkeys_for_role_master: Option<bool>,

    /// Username for basic authentication
    #[arg(long = "basic-auth-username")]
    pub basic_auth_username: Option<String>,

    /// Password for basic authentication
    #[arg(long = "basic-auth-password")]
    pub basic_auth_password: Option<String>,

    /// Whether to emit db metrics (like db_keys) for empty databases
    #[arg(long = "include-metrics-for-empty-databases", num_args = 0..=1, default_missing_value = "true", value_parser = parse_flag_bool)]
    pub include_metrics_for_empty_databases: Option<bool>,
}
