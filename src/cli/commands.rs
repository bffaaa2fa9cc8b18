//! Command definitions for the step timer CLI.
//!
//! Uses clap derive macro for argument parsing. Activities and events are
//! addressed by their 1-based position as shown by `status`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::DurationInput;
use crate::types::{default_data_file, ActivityTarget, DaemonConfig, EventTarget};

// ============================================================================
// CLI Structure
// ============================================================================

/// Step timer CLI - run activities made of timed steps
#[derive(Parser, Debug)]
#[command(
    name = "steptimer",
    version,
    about = "Activity and step timer",
    long_about = "Runs activities made of ordered, individually timed steps.\n\
                  A background daemon keeps time; the other commands talk to it.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (default: ~/.steptimer/steptimer.sock)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show every activity and event
    Status,

    /// Keep showing the activities, redrawing whenever they change
    Watch {
        /// Poll interval in milliseconds
        #[arg(
            long,
            default_value = "100",
            value_parser = clap::value_parser!(u64).range(10..=5000)
        )]
        interval_ms: u64,
    },

    /// Start an event, or resume it if paused
    Play(EventArgs),

    /// Pause a running event, or resume a paused one
    Pause(EventArgs),

    /// Stop an event and discard its progress
    Stop(EventArgs),

    /// Stop an event and start the one after it
    Next(EventArgs),

    /// Stop an event and start the one before it
    Prev(EventArgs),

    /// Start an activity from its first event
    Start(ActivityArgs),

    /// Stop every event of an activity
    Halt(ActivityArgs),

    /// Append a new activity
    AddActivity,

    /// Remove the last activity
    RemoveActivity,

    /// Append an event to an activity
    AddEvent(ActivityArgs),

    /// Remove the last event of an activity
    RemoveEvent(ActivityArgs),

    /// Rename an activity, or one of its events with --event
    Rename(RenameArgs),

    /// Change how long an event runs
    SetDuration(SetDurationArgs),

    /// Expand or collapse an activity in the status view
    Toggle(ActivityArgs),

    /// Discard everything and restore the built-in activity
    Reset,

    /// Run the timer daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

/// Addresses one event
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventArgs {
    /// Activity position (from 1)
    #[arg(value_parser = parse_position)]
    pub activity: usize,

    /// Event position within the activity (from 1)
    #[arg(value_parser = parse_position)]
    pub event: usize,
}

impl EventArgs {
    pub fn target(&self) -> EventTarget {
        EventTarget::new(self.activity, self.event)
    }
}

/// Addresses one activity
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityArgs {
    /// Activity position (from 1)
    #[arg(value_parser = parse_position)]
    pub activity: usize,
}

impl ActivityArgs {
    pub fn target(&self) -> ActivityTarget {
        ActivityTarget::new(self.activity)
    }
}

/// Arguments for the rename command
#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    /// Activity position (from 1)
    #[arg(value_parser = parse_position)]
    pub activity: usize,

    /// Rename this event instead of the activity
    #[arg(short, long, value_parser = parse_position)]
    pub event: Option<usize>,

    /// New title
    #[arg(value_parser = validate_title)]
    pub title: String,
}

/// Arguments for the set-duration command
///
/// Fields are taken as typed: anything that is not a number counts as 0 and
/// values are clamped (minutes and seconds to 59, hundredths to 99). Omitted
/// fields keep their current value.
#[derive(Args, Debug, Clone)]
pub struct SetDurationArgs {
    /// Activity position (from 1)
    #[arg(value_parser = parse_position)]
    pub activity: usize,

    /// Event position within the activity (from 1)
    #[arg(value_parser = parse_position)]
    pub event: usize,

    /// Hours
    #[arg(short = 'H', long, allow_hyphen_values = true)]
    pub hours: Option<String>,

    /// Minutes
    #[arg(short = 'M', long, allow_hyphen_values = true)]
    pub minutes: Option<String>,

    /// Seconds
    #[arg(short = 'S', long, allow_hyphen_values = true)]
    pub seconds: Option<String>,

    /// Hundredths of a second
    #[arg(short = 'c', long, allow_hyphen_values = true)]
    pub hundredths: Option<String>,
}

impl SetDurationArgs {
    pub fn input(&self) -> DurationInput {
        DurationInput {
            hours: self.hours.clone(),
            minutes: self.minutes.clone(),
            seconds: self.seconds.clone(),
            hundredths: self.hundredths.clone(),
        }
    }
}

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// Tick period in milliseconds (1-1000)
    #[arg(
        long,
        default_value = "10",
        value_parser = clap::value_parser!(u64).range(1..=1000)
    )]
    pub tick_ms: u64,

    /// Where activities are saved (default: ~/.steptimer/activities.json)
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Disable cue sounds
    #[arg(long)]
    pub no_sound: bool,

    /// Audio file played when an event starts
    #[arg(long, value_name = "PATH")]
    pub start_sound: Option<PathBuf>,

    /// Audio file played shortly before an event completes
    #[arg(long, value_name = "PATH")]
    pub alert_sound: Option<PathBuf>,
}

impl DaemonArgs {
    /// Builds the daemon configuration, using `socket` when given.
    pub fn to_config(&self, socket: Option<PathBuf>) -> DaemonConfig {
        let mut config = DaemonConfig::default()
            .with_tick_interval_ms(self.tick_ms)
            .with_data_file(self.data_file.clone().unwrap_or_else(default_data_file))
            .with_sound_enabled(!self.no_sound)
            .with_start_sound(self.start_sound.clone())
            .with_alert_sound(self.alert_sound.clone());
        if let Some(socket) = socket {
            config = config.with_socket_path(socket);
        }
        config
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a 1-based position.
fn parse_position(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Positions start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a position", s)),
    }
}

/// Validates a title.
///
/// - Must not be blank
/// - Must not exceed 100 characters
fn validate_title(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("Title must not be empty".to_string());
    }
    if s.chars().count() > 100 {
        return Err("Title must be at most 100 characters".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
