//! Audible cues for timer signals.
//!
//! The engine emits [`Signal`]s; a [`Notifier`] turns them into sound.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  Signal   ┌──────────────┐  AudioCommand  ┌──────────────┐
//! │ TimerEngine  │──────────▶│   Notifier   │───────────────▶│ audio thread │
//! └──────────────┘  (mpsc)   └──────────────┘  (crossbeam)   │   (rodio)    │
//!                                                            └──────────────┘
//! ```
//!
//! Playback failures never reach the engine. When no output device is
//! available the daemon falls back to [`SilentNotifier`].

mod error;
mod player;
mod source;

use std::sync::atomic::{AtomicUsize, Ordering};

pub use error::SoundError;
pub use player::{try_create_notifier, AudioCommand, AudioNotifier, AudioWorker};
pub use source::{default_sound, Cue, CueSounds, SoundSource};

use crate::engine::Signal;

/// Receives timer cues.
///
/// Implementations must not block: they are called from the async runtime.
pub trait Notifier: Send {
    /// An event started or resumed.
    fn on_start(&self);

    /// An event entered its final-seconds alert window.
    fn on_alert(&self);

    /// Silence everything that is playing.
    fn on_stop_all(&self);
}

impl<N: Notifier + Sync + ?Sized> Notifier for std::sync::Arc<N> {
    fn on_start(&self) {
        (**self).on_start();
    }

    fn on_alert(&self) {
        (**self).on_alert();
    }

    fn on_stop_all(&self) {
        (**self).on_stop_all();
    }
}

/// Routes a signal to the matching notifier callback.
///
/// Completion has no cue of its own: the alert already sounded and the
/// next event's start cue follows.
pub fn dispatch(signal: &Signal, notifier: &dyn Notifier) {
    match signal {
        Signal::Started { .. } => notifier.on_start(),
        Signal::Alert { .. } => notifier.on_alert(),
        Signal::Completed { .. } => {}
        Signal::StopAll => notifier.on_stop_all(),
    }
}

/// Notifier that does nothing, used with `--no-sound` or without audio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn on_start(&self) {}
    fn on_alert(&self) {}
    fn on_stop_all(&self) {}
}

/// Mock notifier for testing.
#[derive(Debug, Default)]
pub struct MockNotifier {
    start_calls: AtomicUsize,
    alert_calls: AtomicUsize,
    stop_all_calls: AtomicUsize,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn start_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn alert_count(&self) -> usize {
        self.alert_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stop_all_count(&self) -> usize {
        self.stop_all_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) {
        self.start_calls.store(0, Ordering::SeqCst);
        self.alert_calls.store(0, Ordering::SeqCst);
        self.stop_all_calls.store(0, Ordering::SeqCst);
    }
}

impl Notifier for MockNotifier {
    fn on_start(&self) {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn on_alert(&self) {
        self.alert_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stop_all(&self) {
        self.stop_all_calls.fetch_add(1, Ordering::SeqCst);
    }
}
