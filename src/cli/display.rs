//! Display utilities for the step timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - The activity tree shown by `status` and `watch`

use std::fmt::Write as _;

use crate::model::{format_hundredths, Activity, Event, EventState};
use crate::types::{IpcResponse, ResponseData};

/// Clears the terminal and homes the cursor.
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Width the event title column is padded to.
const TITLE_WIDTH: usize = 28;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the outcome of a command followed by the activity tree.
    pub fn show_result(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("* {}", response.message);
        }
        if let Some(data) = &response.data {
            print!("{}", Self::render(data));
        }
    }

    /// Shows the activity tree.
    pub fn show_status(response: &IpcResponse) {
        match &response.data {
            Some(data) => print!("{}", Self::render(data)),
            None => println!("No activities"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Renders every activity; expanded activities list their events.
    pub fn render(data: &ResponseData) -> String {
        let mut out = String::new();
        for (index, activity) in data.activities.iter().enumerate() {
            Self::render_activity(&mut out, index + 1, activity);
        }
        out
    }

    fn render_activity(out: &mut String, position: usize, activity: &Activity) {
        let fold = if activity.is_expanded() { "-" } else { "+" };
        let _ = write!(out, "{} {}. {}", fold, position, activity.title());
        if activity.is_active() {
            out.push_str(" (active)");
        }
        out.push('\n');

        if activity.is_expanded() {
            for (index, event) in activity.events().iter().enumerate() {
                let _ = writeln!(out, "    {}", Self::render_event(position, index + 1, event));
            }
        } else if let Some(event) = activity.active_event() {
            let index = activity.position_of(event.id()).unwrap_or(0);
            let _ = writeln!(out, "    {}", Self::render_event(position, index + 1, event));
        }
    }

    /// One event line: marker, position, title and `elapsed / duration`.
    pub fn render_event(activity: usize, position: usize, event: &Event) -> String {
        format!(
            "{:<2} {}.{} {:<width$} {} / {}",
            Self::state_marker(event.state()),
            activity,
            position,
            event.title(),
            format_hundredths(event.elapsed()),
            event.duration(),
            width = TITLE_WIDTH
        )
    }

    fn state_marker(state: EventState) -> &'static str {
        match state {
            EventState::Running => ">",
            EventState::Paused => "||",
            EventState::Idle => "",
        }
    }
}

// ============================================================================
// WatchView
// ============================================================================

/// Tracks the last revision drawn so `watch` only redraws on change.
#[derive(Debug, Default)]
pub struct WatchView {
    last_revision: Option<u64>,
}

impl WatchView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a full-screen frame if the data changed since the last one.
    pub fn frame(&mut self, data: &ResponseData) -> Option<String> {
        if self.last_revision == Some(data.revision) {
            return None;
        }
        self.last_revision = Some(data.revision);
        Some(format!("{}{}", CLEAR_SCREEN, Display::render(data)))
    }
}

// ============================================================================
// Tests
// ============================================================================
