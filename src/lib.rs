//! Step Timer Library
//!
//! Runs activities made of ordered, individually timed events. It includes:
//! - Data model for activities, events and durations
//! - Timer engine with the event state machine and tick loop
//! - JSON persistence of the activity list
//! - Audible start and alert cues
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities

pub mod cli;
pub mod daemon;
pub mod engine;
pub mod model;
pub mod persistence;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use engine::{ActivityStore, EventController, Signal, SignalSink, TickReport, TimerEngine};
pub use model::{Activity, ActivityId, DurationInput, Event, EventId, EventState, StepDuration};
pub use persistence::{ActivityRepository, JsonFileRepository, MemoryRepository, PersistenceError};
pub use sound::{MockNotifier, Notifier, SilentNotifier, SoundError};
pub use types::{DaemonConfig, IpcRequest, IpcResponse, ResponseData};
