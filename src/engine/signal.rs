//! Notification signals emitted by the engine.
//!
//! Signals are fire-and-forget: they are pushed onto an unbounded channel in
//! the order the engine produces them, and a dropped receiver never affects
//! the state machine.

use tokio::sync::mpsc;
use tracing::debug;

use crate::model::{ActivityId, EventId};

// ============================================================================
// Signal
// ============================================================================

/// Signals for the audio notifier and other observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// An event started running.
    Started {
        activity: ActivityId,
        event: EventId,
        /// True when a paused run was continued rather than restarted.
        resumed: bool,
    },
    /// The near-completion alert window was reached.
    Alert {
        activity: ActivityId,
        event: EventId,
    },
    /// A timed event reached its duration.
    Completed {
        activity: ActivityId,
        event: EventId,
    },
    /// Any ongoing cue playback should stop.
    StopAll,
}

// ============================================================================
// SignalSink
// ============================================================================

/// Sending half used by the engine.
#[derive(Debug, Clone)]
pub struct SignalSink {
    tx: mpsc::UnboundedSender<Signal>,
}

impl SignalSink {
    pub fn new(tx: mpsc::UnboundedSender<Signal>) -> Self {
        Self { tx }
    }

    /// Creates a sink together with its receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Emits a signal, ignoring a closed receiver.
    pub fn emit(&self, signal: Signal) {
        if self.tx.send(signal).is_err() {
            debug!("Signal receiver closed, dropping {:?}", signal);
        }
    }
}
