//! Collection engine facade.
//!
//! # Responsibilities
//! - Accept the backend address and the fully assembled [`ExporterOptions`]
//! - Hand out the HTTP handler serving the metrics path
//! - Build the outbound and inbound TLS contexts from the material it owns
//!
//! Backend protocol scraping lives behind this type and is not part of the
//! bootstrap; the handler exposes whatever the registry holds.

pub mod options;

use rustls::{ClientConfig, ServerConfig};

use crate::http::server::{build_router, ScrapeState};
use crate::net::tls::{
    build_client_config, build_server_config, ClientTlsMaterial, ServerTlsMaterial, TlsError,
};

pub use options::{BasicAuth, BuildInfo, ExporterOptions};

/// The collection engine as seen by the bootstrap.
#[derive(Debug)]
pub struct Exporter {
    addr: String,
    options: ExporterOptions,
}

impl Exporter {
    /// Construct the exporter for one backend.
    ///
    /// `options` must come from a configuration accepted by
    /// [`validate_config`](crate::config::validation::validate_config), which
    /// owns the metrics path and basic-auth rules.
    pub fn new(addr: impl Into<String>, options: ExporterOptions) -> Self {
        let exporter = Self {
            addr: addr.into(),
            options,
        };
        exporter.register_build_info();

        tracing::debug!(
            addr = %exporter.addr,
            namespace = %exporter.options.namespace,
            scripts = exporter.options.scripts.len(),
            credentials = exporter.options.credentials.len(),
            "Exporter constructed"
        );
        exporter
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn options(&self) -> &ExporterOptions {
        &self.options
    }

    /// HTTP handler for the metrics path, landing page and health check.
    pub fn router(&self) -> axum::Router {
        let state = ScrapeState::new(
            self.options.registry.clone(),
            &self.options.namespace,
            &self.options.metrics_path,
        );
        build_router(state, self.options.basic_auth.clone())
    }

    /// Outbound TLS context for connections to the backend.
    ///
    /// Fails with [`TlsError::MismatchedKeyPair`] if only one half of the
    /// client key pair is configured.
    pub fn create_client_tls_config(&self) -> Result<ClientConfig, TlsError> {
        let tls = &self.options.client_tls;
        let material = ClientTlsMaterial::from_paths(
            &tls.cert_file,
            &tls.key_file,
            &tls.ca_cert_file,
            tls.skip_verification,
        )?;
        build_client_config(&material)
    }

    /// Inbound TLS context for the scrape listener; `Ok(None)` means plaintext.
    pub fn create_server_tls_config(
        &self,
        cert_file: &str,
        key_file: &str,
        ca_cert_file: &str,
        min_version: &str,
    ) -> Result<Option<ServerConfig>, TlsError> {
        let material = ServerTlsMaterial::from_paths(cert_file, key_file, ca_cert_file, min_version)?;
        build_server_config(&material)
    }

    fn register_build_info(&self) {
        let name = format!("{}_exporter_build_info", self.options.namespace);
        let info = &self.options.build_info;
        self.options.registry.record(|| {
            metrics::describe_gauge!(name.clone(), "redis exporter build information");
            metrics::gauge!(
                name,
                "version" => info.version.clone(),
                "commit_sha" => info.commit_sha.clone(),
                "build_date" => info.date.clone()
            )
            .set(1.0);
        });
    }
}
