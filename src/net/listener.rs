//! TCP listener binding.
//!
//! # Responsibilities
//! - Accept Go-style listen addresses (":9121" binds every IPv4 interface)
//! - Resolve host names and bind the first address that works
//! - Report bind failures with the offending address

use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Address could not be parsed or resolved.
    InvalidAddress(String, std::io::Error),
    /// Failed to bind to address.
    Bind(String, std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::InvalidAddress(addr, e) => {
                write!(f, "Invalid listen address {}: {}", addr, e)
            }
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::InvalidAddress(_, e) | ListenerError::Bind(_, e) => Some(e),
        }
    }
}

/// Expand an empty host (":9121") to the IPv4 wildcard.
pub fn normalize_listen_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    }
}

/// Bind a listening socket for the HTTP server.
///
/// The socket is put in non-blocking mode so it can be handed to the async
/// server driver.
pub fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let normalized = normalize_listen_address(address);
    let candidates: Vec<SocketAddr> = normalized
        .to_socket_addrs()
        .map_err(|e| ListenerError::InvalidAddress(address.to_string(), e))?
        .collect();

    let mut last_error = None;
    for addr in candidates {
        match TcpListener::bind(addr) {
            Ok(listener) => {
                listener
                    .set_nonblocking(true)
                    .map_err(|e| ListenerError::Bind(address.to_string(), e))?;
                tracing::debug!(address = %addr, "Listener bound");
                return Ok(listener);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(ListenerError::Bind(
        address.to_string(),
        last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no addresses resolved")
        }),
    ))
}
