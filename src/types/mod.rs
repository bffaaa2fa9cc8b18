//! Shared data types for the daemon and its clients.
//!
//! This module defines the data structures used for:
//! - Daemon configuration with validation
//! - IPC request/response serialization

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::ActivityStore;
use crate::model::{Activity, DurationInput};

/// Directory name under the home directory for saved data and the socket.
const DATA_DIR_NAME: &str = ".steptimer";

// ============================================================================
// Paths
// ============================================================================

/// Returns `~/.steptimer`, or a directory under the system temp dir when
/// no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DATA_DIR_NAME)
}

/// Default location of the saved activity list.
pub fn default_data_file() -> PathBuf {
    default_data_dir().join("activities.json")
}

/// Default location of the daemon socket.
pub fn default_socket_path() -> PathBuf {
    default_data_dir().join("steptimer.sock")
}

// ============================================================================
// DaemonConfig
// ============================================================================

/// Configuration for the timer daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Tick period in milliseconds (1-1000)
    pub tick_interval_ms: u64,
    /// Where the activity list is saved
    pub data_file: PathBuf,
    /// Unix socket the daemon listens on
    pub socket_path: PathBuf,
    /// Whether cues are played
    pub sound_enabled: bool,
    /// Custom start cue (built-in tone when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_sound: Option<PathBuf>,
    /// Custom alert cue (built-in tone when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_sound: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            data_file: default_data_file(),
            socket_path: default_socket_path(),
            sound_enabled: true,
            start_sound: None,
            alert_sound: None,
        }
    }
}

impl DaemonConfig {
    pub fn with_tick_interval_ms(mut self, millis: u64) -> Self {
        self.tick_interval_ms = millis;
        self
    }

    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    pub fn with_sound_enabled(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    pub fn with_start_sound(mut self, path: Option<PathBuf>) -> Self {
        self.start_sound = path;
        self
    }

    pub fn with_alert_sound(mut self, path: Option<PathBuf>) -> Self {
        self.alert_sound = path;
        self
    }

    /// The tick period as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms < 1 || self.tick_interval_ms > 1000 {
            return Err("Tick interval must be between 1 and 1000 milliseconds".to_string());
        }
        if self.data_file.as_os_str().is_empty() {
            return Err("Data file path must not be empty".to_string());
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err("Socket path must not be empty".to_string());
        }
        if self.data_file == self.socket_path {
            return Err("Data file and socket must be different paths".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// Addresses an event by its 1-based activity and event positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTarget {
    pub activity: usize,
    pub event: usize,
}

impl EventTarget {
    pub fn new(activity: usize, event: usize) -> Self {
        Self { activity, event }
    }
}

/// Addresses an activity by its 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTarget {
    pub activity: usize,
}

impl ActivityTarget {
    pub fn new(activity: usize) -> Self {
        Self { activity }
    }
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Query the activity list
    Status,
    /// Start or resume an event
    Play(EventTarget),
    /// Pause a running event, or resume a paused one
    Pause(EventTarget),
    /// Stop an event and discard its progress
    Stop(EventTarget),
    /// Move to the following event
    Next(EventTarget),
    /// Move to the preceding event
    Prev(EventTarget),
    /// Start an activity from its first event
    PlayActivity(ActivityTarget),
    /// Stop every event of an activity
    StopActivity(ActivityTarget),
    /// Append a new activity
    AddActivity,
    /// Remove the last activity
    RemoveActivity,
    /// Append an event to an activity
    AddEvent(ActivityTarget),
    /// Remove the last event of an activity
    RemoveEvent(ActivityTarget),
    /// Rename an activity, or one of its events when `event` is set
    Rename {
        activity: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<usize>,
        title: String,
    },
    /// Change an event's duration from typed fields
    SetDuration {
        activity: usize,
        event: usize,
        #[serde(flatten)]
        input: DurationInput,
    },
    /// Expand or collapse an activity in the view
    Toggle(ActivityTarget),
    /// Restore the built-in default activity
    Reset,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Store revision; changes whenever any activity changes
    pub revision: u64,
    /// Every activity in display order
    pub activities: Vec<Activity>,
}

impl ResponseData {
    /// Creates response data from the store.
    pub fn from_store(store: &ActivityStore) -> Self {
        Self {
            revision: store.revision(),
            activities: store.activities().to_vec(),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
