//! TLS material loading and context construction.
//!
//! Two independent builders:
//! - outbound ([`build_client_config`]): the exporter authenticating to the backend
//! - inbound ([`build_server_config`]): scrape clients connecting to the exporter
//!
//! The crypto provider is chosen explicitly so builds with more than one
//! provider compiled in still resolve deterministically.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::server::WebPkiClientVerifier;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, ServerConfig, SignatureScheme};
use thiserror::Error;

/// Errors raised while building TLS contexts.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("TLS client key file and cert file should both be present")]
    MismatchedKeyPair,

    #[error("failed to read {path:?}: {source}")]
    ReadPem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("unknown TLS version {0:?}, expected one of TLS1.0, TLS1.1, TLS1.2, TLS1.3")]
    UnknownMinVersion(String),

    #[error("client certificate verifier: {0}")]
    ClientVerifier(#[from] rustls::server::VerifierBuilderError),

    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Minimum protocol version accepted by the inbound listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsMinVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl FromStr for TlsMinVersion {
    type Err = TlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TLS1.0" => Ok(TlsMinVersion::Tls10),
            "TLS1.1" => Ok(TlsMinVersion::Tls11),
            "TLS1.2" => Ok(TlsMinVersion::Tls12),
            "TLS1.3" => Ok(TlsMinVersion::Tls13),
            other => Err(TlsError::UnknownMinVersion(other.to_string())),
        }
    }
}

impl TlsMinVersion {
    /// Protocol versions at or above this floor.
    ///
    /// rustls implements TLS 1.2 and 1.3 only, so older floors resolve to 1.2.
    pub fn protocol_versions(self) -> &'static [&'static rustls::SupportedProtocolVersion] {
        static FROM_TLS12: &[&rustls::SupportedProtocolVersion] =
            &[&rustls::version::TLS13, &rustls::version::TLS12];
        static ONLY_TLS13: &[&rustls::SupportedProtocolVersion] = &[&rustls::version::TLS13];

        match self {
            TlsMinVersion::Tls13 => ONLY_TLS13,
            _ => FROM_TLS12,
        }
    }
}

/// A certificate chain and its private key, both PEM files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

fn non_empty(path: &str) -> Option<PathBuf> {
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// Outbound TLS material.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientTlsMaterial {
    pub identity: Option<KeyPairPaths>,
    pub ca_cert: Option<PathBuf>,
    pub skip_verification: bool,
}

impl ClientTlsMaterial {
    /// Build from option values, enforcing that cert and key come together.
    pub fn from_paths(
        cert_file: &str,
        key_file: &str,
        ca_cert_file: &str,
        skip_verification: bool,
    ) -> Result<Self, TlsError> {
        check_client_key_pair(cert_file, key_file)?;
        let identity = match (non_empty(cert_file), non_empty(key_file)) {
            (Some(cert), Some(key)) => Some(KeyPairPaths { cert, key }),
            _ => None,
        };
        Ok(Self {
            identity,
            ca_cert: non_empty(ca_cert_file),
            skip_verification,
        })
    }
}

/// Pre-flight check: a client certificate without its key (or vice versa) is rejected.
pub fn check_client_key_pair(cert_file: &str, key_file: &str) -> Result<(), TlsError> {
    if cert_file.is_empty() != key_file.is_empty() {
        return Err(TlsError::MismatchedKeyPair);
    }
    Ok(())
}

/// Inbound TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTlsMaterial {
    /// `None` means the listener serves plaintext.
    pub identity: Option<KeyPairPaths>,
    /// When present, scrape clients must present a certificate signed by it.
    pub client_ca: Option<PathBuf>,
    pub min_version: TlsMinVersion,
}

impl ServerTlsMaterial {
    /// Build from option values.
    ///
    /// The minimum version selector is validated even in plaintext mode so a
    /// typo is caught before the operator enables TLS.
    pub fn from_paths(
        cert_file: &str,
        key_file: &str,
        ca_cert_file: &str,
        min_version: &str,
    ) -> Result<Self, TlsError> {
        let min_version = min_version.parse()?;
        let identity = match (non_empty(cert_file), non_empty(key_file)) {
            (Some(cert), Some(key)) => Some(KeyPairPaths { cert, key }),
            (None, None) => None,
            _ => {
                tracing::warn!(
                    cert_file,
                    key_file,
                    "Only one of the TLS server cert and key files is set, serving plaintext"
                );
                None
            }
        };
        Ok(Self {
            identity,
            client_ca: non_empty(ca_cert_file),
            min_version,
        })
    }

    pub fn is_plaintext(&self) -> bool {
        self.identity.is_none()
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::aws_lc_rs::default_provider())
}

fn open_pem(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::ReadPem {
            path: path.to_path_buf(),
            source,
        })
}

/// Load every certificate from a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open_pem(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::ReadPem {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

/// Load the first private key (PKCS#1, PKCS#8 or SEC1) from a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open_pem(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::ReadPem {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}

/// Load a CA bundle into a fresh trust pool.
pub fn load_ca_pool(path: &Path) -> Result<RootCertStore, TlsError> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(path)? {
        roots.add(cert)?;
    }
    Ok(roots)
}

fn native_roots() -> RootCertStore {
    let result = rustls_native_certs::load_native_certs();
    for err in &result.errors {
        tracing::warn!(error = %err, "Error loading native certificate");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(result.certs);
    tracing::debug!(added, ignored, "Loaded native root certificates");
    roots
}

/// Build the outbound (exporter → backend) TLS context.
pub fn build_client_config(material: &ClientTlsMaterial) -> Result<ClientConfig, TlsError> {
    let provider = crypto_provider();
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    // A configured CA must load even when verification is skipped.
    let ca_pool = material.ca_cert.as_deref().map(load_ca_pool).transpose()?;

    let builder = if material.skip_verification {
        tracing::warn!("TLS verification of the Redis server is disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(SkipServerVerification::new(&provider)))
    } else {
        builder.with_root_certificates(ca_pool.unwrap_or_else(native_roots))
    };

    let config = match &material.identity {
        Some(pair) => {
            let chain = load_certs(&pair.cert)?;
            let key = load_private_key(&pair.key)?;
            builder.with_client_auth_cert(chain, key)?
        }
        None => builder.with_no_client_auth(),
    };

    Ok(config)
}

/// Build the inbound (scrape client → exporter) TLS context.
///
/// Returns `Ok(None)` when no server certificate is configured, which means
/// the listener runs in plaintext.
pub fn build_server_config(material: &ServerTlsMaterial) -> Result<Option<ServerConfig>, TlsError> {
    let Some(pair) = &material.identity else {
        return Ok(None);
    };

    if material.min_version < TlsMinVersion::Tls12 {
        tracing::warn!(
            requested = ?material.min_version,
            "TLS versions below 1.2 are not supported, using TLS1.2 as the floor"
        );
    }

    let provider = crypto_provider();
    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(material.min_version.protocol_versions())?;

    let builder = match &material.client_ca {
        Some(ca) => {
            let roots = load_ca_pool(ca)?;
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .build()?;
            tracing::debug!(client_ca = %ca.display(), "Requiring client certificates");
            builder.with_client_cert_verifier(verifier)
        }
        None => builder.with_no_client_auth(),
    };

    let chain = load_certs(&pair.cert)?;
    let key = load_private_key(&pair.key)?;
    let mut config = builder.with_single_cert(chain, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Some(config))
}

/// Accepts any server certificate; handshake signatures are still checked.
#[derive(Debug)]
struct SkipServerVerification {
    algorithms: WebPkiSupportedAlgorithms,
}

impl SkipServerVerification {
    fn new(provider: &CryptoProvider) -> Self {
        Self {
            algorithms: provider.signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
