//! Escalation of unrecoverable errors to process shutdown.
//!
//! Every outgoing response passes through [`EscalationMonitor::inspect`]. An
//! `Unrecoverable` error emits one payload-free signal on the injected
//! [`ExitSink`]. Sinks never block the request path.

use crate::models::ErrorMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Write-only, non-blocking exit notification channel.
pub trait ExitSink: Send + Sync {
    /// Emit one exit signal. Must not block.
    fn notify_exit(&self);
}

/// Buffers every signal.
impl ExitSink for mpsc::UnboundedSender<()> {
    fn notify_exit(&self) {
        if self.send(()).is_err() {
            tracing::warn!("exit receiver dropped; signal discarded");
        }
    }
}

/// Drops the signal when the buffer is full.
impl ExitSink for mpsc::Sender<()> {
    fn notify_exit(&self) {
        match self.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::warn!("exit channel full; signal dropped");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::warn!("exit receiver dropped; signal discarded");
            }
        }
    }
}

impl<S: ExitSink + ?Sized> ExitSink for Arc<S> {
    fn notify_exit(&self) {
        (**self).notify_exit()
    }
}

/// Inspects response errors and escalates unrecoverable ones.
#[derive(Clone)]
pub struct EscalationMonitor {
    sink: Arc<dyn ExitSink>,
}

impl EscalationMonitor {
    /// Create a monitor emitting on `sink`.
    pub fn new(sink: Arc<dyn ExitSink>) -> Self {
        Self { sink }
    }

    /// Escalate `error` if it is unrecoverable. Returns whether a signal was emitted.
    pub fn inspect(&self, error: Option<&ErrorMessage>) -> bool {
        match error {
            Some(error) if error.is_unrecoverable() => {
                tracing::error!(error = %error, "unrecoverable-error");
                self.sink.notify_exit();
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for EscalationMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationMonitor").finish_non_exhaustive()
    }
}

/// Receiving end of the exit channel, held by the runtime.
#[derive(Debug)]
pub enum ExitReceiver {
    Unbounded(mpsc::UnboundedReceiver<()>),
    Bounded(mpsc::Receiver<()>),
}

impl ExitReceiver {
    /// Wait for the next exit signal. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<()> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }
}

/// Exit channel for the configured capacity; `0` means unbounded.
pub fn exit_channel(capacity: usize) -> (Arc<dyn ExitSink>, ExitReceiver) {
    if capacity == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(tx), ExitReceiver::Unbounded(rx))
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (Arc::new(tx), ExitReceiver::Bounded(rx))
    }
}
