//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use redis_exporter::config::ExporterConfig;
use redis_exporter::lifecycle::{
    prepare, signals, LifecycleError, LifecycleState, SignalSender,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

/// CA, server and client material written to a temporary directory.
pub struct Pki {
    pub dir: TempDir,
    pub ca_cert: PathBuf,
    pub server_cert: PathBuf,
    pub server_key: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

struct Authority {
    cert: Certificate,
    key: KeyPair,
}

fn authority(name: &str) -> Authority {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.distinguished_name.push(DnType::CommonName, name);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    let cert = params.self_signed(&key).unwrap();
    Authority { cert, key }
}

fn leaf(ca: &Authority, names: &[&str], usage: ExtendedKeyUsagePurpose) -> (String, String) {
    let key = KeyPair::generate().unwrap();
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let mut params = CertificateParams::new(names).unwrap();
    params.distinguished_name.push(DnType::CommonName, "redis-exporter test");
    params.extended_key_usages = vec![usage];
    let cert = params.signed_by(&key, &ca.cert, &ca.key).unwrap();
    (cert.pem(), key.serialize_pem())
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Generate a fresh PKI with one CA signing a server and a client certificate.
pub fn pki() -> Pki {
    let dir = tempfile::tempdir().unwrap();
    let ca = authority("redis-exporter test ca");
    let (server_cert, server_key) = leaf(
        &ca,
        &["localhost", "127.0.0.1"],
        ExtendedKeyUsagePurpose::ServerAuth,
    );
    let (client_cert, client_key) = leaf(&ca, &["scraper"], ExtendedKeyUsagePurpose::ClientAuth);

    Pki {
        ca_cert: write(dir.path(), "ca.crt", &ca.cert.pem()),
        server_cert: write(dir.path(), "server.crt", &server_cert),
        server_key: write(dir.path(), "server.key", &server_key),
        client_cert: write(dir.path(), "client.crt", &client_cert),
        client_key: write(dir.path(), "client.key", &client_key),
        dir,
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Default configuration bound to an ephemeral loopback port.
pub fn local_config() -> ExporterConfig {
    let mut config = ExporterConfig::default();
    config.web.listen_address = "127.0.0.1:0".to_string();
    config
}

/// A serving exporter driven by a test-owned signal queue.
pub struct Running {
    pub addr: SocketAddr,
    pub signals: SignalSender,
    pub task: JoinHandle<(Result<(), LifecycleError>, LifecycleState)>,
}

/// Prepare and start the exporter, then wait for signals in the background.
pub async fn start(config: &ExporterConfig) -> Running {
    let mut lifecycle = prepare(config).unwrap().lifecycle;
    let addr = lifecycle.start().await.unwrap();

    let (tx, rx) = signals::channel();
    let task = tokio::spawn(async move {
        let result = lifecycle.run(rx).await;
        (result, lifecycle.state())
    });

    Running {
        addr,
        signals: tx,
        task,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Trust pool holding only the test CA.
pub fn ca_roots(pki: &Pki) -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();
    let ca = std::fs::read(&pki.ca_cert).unwrap();
    for cert in rustls_pemfile::certs(&mut ca.as_slice()) {
        roots.add(cert.unwrap()).unwrap();
    }
    roots
}

/// rustls client trusting the test CA, optionally presenting the client certificate.
pub fn tls_client(pki: &Pki, with_identity: bool) -> rustls::ClientConfig {
    let builder = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_root_certificates(ca_roots(pki));

    if with_identity {
        let pem = std::fs::read(&pki.client_cert).unwrap();
        let chain = rustls_pemfile::certs(&mut pem.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let key_pem = std::fs::read(&pki.client_key).unwrap();
        let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
            .unwrap()
            .unwrap();
        builder.with_client_auth_cert(chain, key).unwrap()
    } else {
        builder.with_no_client_auth()
    }
}

/// Issue `GET <path>` over TLS and return the raw HTTP/1.1 response.
pub async fn tls_get(
    addr: SocketAddr,
    config: rustls::ClientConfig,
    path: &str,
) -> std::io::Result<String> {
    let connector = tokio_rustls::TlsConnector::from(Arc::new(config));
    let stream = tokio::net::TcpStream::connect(addr).await?;
    let server_name = rustls::pki_types::ServerName::try_from("localhost")
        .map_err(std::io::Error::other)?;
    let mut tls = connector.connect(server_name, stream).await?;

    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    tls.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    match tls.read_to_end(&mut response).await {
        Ok(_) => {}
        // Missing close_notify after a complete response.
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && !response.is_empty() => {}
        Err(e) => return Err(e),
    }
    Ok(String::from_utf8_lossy(&response).into_owned())
}
