//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Credentials → Registry → Exporter → TLS → Bind
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → single-slot queue (first one wins)
//!
//! Shutdown (shutdown.rs):
//!     Serving → signal received → stop accepting → drain (10s bound) → Stopped
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then credentials and TLS, then the listener
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has a timeout: exceeding it is fatal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{LifecycleError, LifecycleState, ServeOutcome, ServerLifecycle, SHUTDOWN_TIMEOUT};
pub use signals::{listen_for_termination, SignalReceiver, SignalSender, TerminationSignal};
pub use startup::{prepare, serve, Bootstrap, StartupError};
