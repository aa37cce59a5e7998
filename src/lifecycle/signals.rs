//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM
//! - Feed the first signal into a single-slot queue
//! - Swallow later signals so they cannot start a second shutdown
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The receiving end is consumed by value, so it can be awaited only once
//! - No other signals are handled

use std::fmt;

use tokio::sync::mpsc;

/// A signal that requests a graceful stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl TerminationSignal {
    pub fn name(self) -> &'static str {
        match self {
            TerminationSignal::Interrupt => "interrupt",
            TerminationSignal::Terminate => "terminated",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Producer side of the termination queue.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::Sender<TerminationSignal>,
}

impl SignalSender {
    /// Queue a signal. Returns `false` if one is already pending or the
    /// receiver has been consumed.
    pub fn deliver(&self, signal: TerminationSignal) -> bool {
        self.tx.try_send(signal).is_ok()
    }
}

/// Consumer side of the termination queue.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: mpsc::Receiver<TerminationSignal>,
}

impl SignalReceiver {
    /// Wait for the first signal. `None` means every sender is gone.
    pub async fn recv(mut self) -> Option<TerminationSignal> {
        self.rx.recv().await
    }
}

/// Create a single-slot termination queue.
pub fn channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (SignalSender { tx }, SignalReceiver { rx })
}

/// Register OS handlers and return the queue they feed.
///
/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn listen_for_termination() -> std::io::Result<SignalReceiver> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let (tx, rx) = channel();

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => TerminationSignal::Interrupt,
                Some(()) = terminate.recv() => TerminationSignal::Terminate,
                else => break,
            };
            if !tx.deliver(received) {
                tracing::debug!(signal = %received, "Shutdown already requested, ignoring signal");
            }
        }
    });

    Ok(rx)
}

#[cfg(not(unix))]
pub fn listen_for_termination() -> std::io::Result<SignalReceiver> {
    let (tx, rx) = channel();

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !tx.deliver(TerminationSignal::Interrupt) {
                tracing::debug!("Shutdown already requested, ignoring signal");
            }
        }
    });

    Ok(rx)
}
