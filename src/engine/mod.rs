//! The timer and state-machine core.
//!
//! - `store`: the ordered activity collection and its id index
//! - `controller`: play/pause/stop/next/prev and editing operations
//! - `timer`: the tick loop, alert window and auto-advance
//! - `signal`: notifications emitted for audio and other observers

pub mod controller;
pub mod signal;
pub mod store;
pub mod timer;

pub use controller::EventController;
pub use signal::{Signal, SignalSink};
pub use store::{ActivityStore, EventLocation};
pub use timer::{in_alert_window, run_ticker, TickReport, TimerEngine, DEFAULT_TICK_INTERVAL};
