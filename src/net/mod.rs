//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listen address option
//!     → listener.rs (normalize, resolve, bind)
//!     → tls.rs (optional inbound TLS context)
//!     → lifecycle (server worker owns the socket)
//!
//! backend TLS options
//!     → tls.rs (outbound TLS context, handed to the collection engine)
//! ```
//!
//! # Design Decisions
//! - Binding happens on the controlling task so bind errors surface before serving
//! - TLS is optional and fully built before the worker starts

pub mod listener;
pub mod tls;
