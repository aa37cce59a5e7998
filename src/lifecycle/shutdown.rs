//! Server lifecycle state machine.
//!
//! # Responsibilities
//! - Run the listener on a background worker, plain or TLS
//! - Report the bound address once the worker is accepting
//! - Wait for a termination signal, then drain within a fixed bound
//!
//! # Design Decisions
//! - Use-once: a stopped or failed lifecycle cannot be restarted
//! - A clean `Ok` from the serve loop is [`ServeOutcome::Closed`], the expected
//!   end of a graceful stop, and never reported as an error
//! - The bound is enforced around the worker, so a timeout stays
//!   distinguishable from a clean stop

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::lifecycle::signals::SignalReceiver;

/// Bound on draining in-flight requests after a termination signal.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Serving,
    ShuttingDown,
    Stopped,
    Failed,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not start HTTP server on {address}: {source}")]
    ServerStart {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("server shutdown failed: {0}")]
    ShutdownFailed(String),

    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
}

/// How the serve loop ended.
#[derive(Debug)]
pub enum ServeOutcome {
    /// Listener closed by a graceful shutdown.
    Closed,
    /// Listener failed.
    Failed(std::io::Error),
}

impl From<std::io::Result<()>> for ServeOutcome {
    fn from(result: std::io::Result<()>) -> Self {
        match result {
            Ok(()) => ServeOutcome::Closed,
            Err(e) => ServeOutcome::Failed(e),
        }
    }
}

/// Owns the listener from bind to stop.
pub struct ServerLifecycle {
    state: LifecycleState,
    address: String,
    listener: Option<TcpListener>,
    router: Option<Router>,
    tls: Option<RustlsConfig>,
    handle: Handle,
    worker: Option<JoinHandle<ServeOutcome>>,
    local_addr: Option<SocketAddr>,
    shutdown_timeout: Duration,
}

impl ServerLifecycle {
    /// Configure the lifecycle with a bound listener and its handler.
    ///
    /// `tls` must be fully built; `None` serves plaintext.
    pub fn new(listener: TcpListener, router: Router, tls: Option<rustls::ServerConfig>) -> Self {
        let address = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        Self {
            state: LifecycleState::Initializing,
            address,
            listener: Some(listener),
            router: Some(router),
            tls: tls.map(|config| RustlsConfig::from_config(Arc::new(config))),
            handle: Handle::new(),
            worker: None,
            local_addr: None,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
        }
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Address the worker is accepting on, once serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Spawn the worker and wait until it is accepting connections.
    pub async fn start(&mut self) -> Result<SocketAddr, LifecycleError> {
        if self.state != LifecycleState::Initializing {
            return Err(self.invalid("start"));
        }
        let (Some(listener), Some(router)) = (self.listener.take(), self.router.take()) else {
            return Err(self.invalid("start"));
        };

        let handle = self.handle.clone();
        let app = router.into_make_service();
        let worker = match self.tls.clone() {
            Some(config) => tokio::spawn(async move {
                ServeOutcome::from(
                    axum_server::from_tcp_rustls(listener, config)
                        .handle(handle)
                        .serve(app)
                        .await,
                )
            }),
            None => tokio::spawn(async move {
                ServeOutcome::from(
                    axum_server::from_tcp(listener)
                        .handle(handle)
                        .serve(app)
                        .await,
                )
            }),
        };

        match self.handle.listening().await {
            Some(addr) => {
                self.worker = Some(worker);
                self.local_addr = Some(addr);
                self.state = LifecycleState::Serving;
                tracing::info!(address = %addr, tls = self.is_tls(), "Server listening");
                Ok(addr)
            }
            None => {
                self.state = LifecycleState::Failed;
                Err(self.start_error(worker.await))
            }
        }
    }

    /// Serve until the first termination signal, then shut down.
    pub async fn run(&mut self, signals: SignalReceiver) -> Result<(), LifecycleError> {
        if self.state != LifecycleState::Serving {
            return Err(self.invalid("wait for signals"));
        }
        let Some(mut worker) = self.worker.take() else {
            return Err(self.invalid("wait for signals"));
        };

        tokio::select! {
            received = signals.recv() => {
                match received {
                    Some(signal) => tracing::info!(signal = %signal, "Received signal, shutting down"),
                    None => tracing::info!("Signal source closed, shutting down"),
                }
                self.worker = Some(worker);
            }
            outcome = &mut worker => {
                self.state = LifecycleState::Failed;
                return Err(match outcome {
                    Ok(ServeOutcome::Closed) => LifecycleError::ShutdownFailed(
                        "server closed without a shutdown request".to_string(),
                    ),
                    other => self.start_error(other),
                });
            }
        }

        self.shutdown().await
    }

    /// Stop accepting and wait for in-flight requests within the bound.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        if self.state != LifecycleState::Serving {
            return Err(self.invalid("shut down"));
        }
        let Some(worker) = self.worker.take() else {
            return Err(self.invalid("shut down"));
        };

        self.state = LifecycleState::ShuttingDown;
        tracing::info!(
            connections = self.handle.connection_count(),
            timeout = ?self.shutdown_timeout,
            "Shutting down server"
        );
        self.handle.graceful_shutdown(None);

        match tokio::time::timeout(self.shutdown_timeout, worker).await {
            Ok(Ok(ServeOutcome::Closed)) => {
                self.state = LifecycleState::Stopped;
                tracing::info!("Server shut down gracefully");
                Ok(())
            }
            Ok(Ok(ServeOutcome::Failed(e))) => {
                self.state = LifecycleState::Failed;
                Err(LifecycleError::ShutdownFailed(e.to_string()))
            }
            Ok(Err(join)) => {
                self.state = LifecycleState::Failed;
                Err(LifecycleError::ShutdownFailed(join.to_string()))
            }
            Err(_) => {
                self.state = LifecycleState::Failed;
                Err(LifecycleError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }

    fn invalid(&self, operation: &'static str) -> LifecycleError {
        LifecycleError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn start_error(
        &self,
        outcome: Result<ServeOutcome, tokio::task::JoinError>,
    ) -> LifecycleError {
        let source = match outcome {
            Ok(ServeOutcome::Failed(e)) => e,
            Ok(ServeOutcome::Closed) => {
                std::io::Error::other("listener closed before accepting connections")
            }
            Err(join) => std::io::Error::other(join.to_string()),
        };
        LifecycleError::ServerStart {
            address: self.address.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for ServerLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerLifecycle")
            .field("state", &self.state)
            .field("address", &self.address)
            .field("tls", &self.is_tls())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::signals::{channel, TerminationSignal};
    use axum::routing::get;

    fn bound() -> TcpListener {
        crate::net::listener::bind("127.0.0.1:0").unwrap()
    }

    fn app() -> Router {
        Router::new().route("/", get(|| async { "hi" }))
    }

    #[tokio::test]
    async fn start_then_signal_stops_gracefully() {
        let mut lifecycle = ServerLifecycle::new(bound(), app(), None);
        assert_eq!(lifecycle.state(), LifecycleState::Initializing);

        let addr = lifecycle.start().await.unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Serving);
        assert_eq!(lifecycle.local_addr(), Some(addr));

        let (tx, rx) = channel();
        assert!(tx.deliver(TerminationSignal::Interrupt));
        lifecycle.run(rx).await.unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn is_use_once() {
        let mut lifecycle = ServerLifecycle::new(bound(), app(), None);
        lifecycle.start().await.unwrap();
        lifecycle.shutdown().await.unwrap();

        assert!(matches!(
            lifecycle.start().await,
            Err(LifecycleError::InvalidState { .. })
        ));
        assert!(matches!(
            lifecycle.shutdown().await,
            Err(LifecycleError::InvalidState {
                state: LifecycleState::Stopped,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn run_before_start_is_rejected() {
        let mut lifecycle = ServerLifecycle::new(bound(), app(), None);
        let (_tx, rx) = channel();
        assert!(matches!(
            lifecycle.run(rx).await,
            Err(LifecycleError::InvalidState {
                state: LifecycleState::Initializing,
                ..
            })
        ));
    }

    #[test]
    fn clean_serve_result_is_closed() {
        assert!(matches!(ServeOutcome::from(Ok(())), ServeOutcome::Closed));
        assert!(matches!(
            ServeOutcome::from(Err(std::io::Error::other("boom"))),
            ServeOutcome::Failed(_)
        ));
    }
}
