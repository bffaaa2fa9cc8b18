//! Data model: activities, events and their identifiers.
//!
//! An [`Activity`] is an ordered, never-empty list of [`Event`]s. Each event
//! carries its configured [`StepDuration`], its elapsed time and its
//! [`EventState`]. The types here only know how to mutate themselves; the
//! rules that span several entities live in [`crate::engine`].

mod duration;

pub use duration::{
    format_hundredths, parse_field, DurationInput, StepDuration, HUNDREDTHS_PER_HOUR,
    HUNDREDTHS_PER_MINUTE, HUNDREDTHS_PER_SECOND,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to an activity created with [`Activity::new_default`].
pub const NEW_ACTIVITY_TITLE: &str = "New activity";

/// Title of the single event a new activity starts with.
pub const FIRST_EVENT_TITLE: &str = "Warm-up";

/// Title given to an event created with [`Event::new_default`].
pub const NEW_EVENT_TITLE: &str = "New event";

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of an [`Activity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(Uuid);

impl ActivityId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// EventState
// ============================================================================

/// Run state of a single event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    /// Not started, or stopped. Elapsed time is zero.
    #[default]
    Idle,
    /// Counting up one hundredth per tick.
    Running,
    /// Elapsed time frozen, can be resumed.
    Paused,
}

impl EventState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Idle => "idle",
            EventState::Running => "running",
            EventState::Paused => "paused",
        }
    }

    /// Returns true for Running and Paused.
    pub fn is_active(&self) -> bool {
        matches!(self, EventState::Running | EventState::Paused)
    }
}

// ============================================================================
// Event
// ============================================================================

/// A single named, optionally timed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    title: String,
    #[serde(default)]
    duration: StepDuration,
    /// Hundredths of a second since the last (re)start.
    #[serde(default)]
    elapsed: u64,
    #[serde(default)]
    state: EventState,
    #[serde(default)]
    alert_triggered: bool,
}

impl Event {
    /// Creates an idle event with a fresh id.
    #[must_use]
    pub fn new(title: impl Into<String>, duration: StepDuration) -> Self {
        Self {
            id: EventId::generate(),
            title: title.into(),
            duration,
            elapsed: 0,
            state: EventState::Idle,
            alert_triggered: false,
        }
    }

    /// Creates the event appended by "add event".
    #[must_use]
    pub fn new_default() -> Self {
        Self::new(NEW_EVENT_TITLE, StepDuration::ZERO)
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn duration(&self) -> StepDuration {
        self.duration
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn state(&self) -> EventState {
        self.state
    }

    pub fn alert_triggered(&self) -> bool {
        self.alert_triggered
    }

    /// Returns true if the event is Running or Paused.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_running(&self) -> bool {
        self.state == EventState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == EventState::Paused
    }

    /// Signed time left in hundredths. Negative once overrun, and always
    /// negative for untimed events that have been running.
    pub fn time_left(&self) -> i64 {
        let total = i64::try_from(self.duration.total_hundredths()).unwrap_or(i64::MAX);
        let elapsed = i64::try_from(self.elapsed).unwrap_or(i64::MAX);
        total - elapsed
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_duration(&mut self, duration: StepDuration) {
        self.duration = duration;
    }

    pub(crate) fn regenerate_id(&mut self) {
        self.id = EventId::generate();
    }

    /// Starts from zero.
    pub(crate) fn start_fresh(&mut self) {
        self.elapsed = 0;
        self.alert_triggered = false;
        self.state = EventState::Running;
    }

    /// Continues a paused run without touching elapsed time.
    pub(crate) fn resume(&mut self) {
        if self.state == EventState::Paused {
            self.state = EventState::Running;
        }
    }

    pub(crate) fn pause(&mut self) {
        if self.state == EventState::Running {
            self.state = EventState::Paused;
        }
    }

    /// Back to Idle with all run progress cleared.
    pub(crate) fn reset(&mut self) {
        self.elapsed = 0;
        self.alert_triggered = false;
        self.state = EventState::Idle;
    }

    /// Adds one hundredth of a second. Returns the new elapsed value.
    pub(crate) fn advance(&mut self) -> u64 {
        self.elapsed = self.elapsed.saturating_add(1);
        self.elapsed
    }

    pub(crate) fn mark_alert_triggered(&mut self) {
        self.alert_triggered = true;
    }
}

// ============================================================================
// Activity
// ============================================================================

/// An ordered group of events, such as a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    id: ActivityId,
    title: String,
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    is_active: bool,
    /// View-only flag.
    #[serde(default)]
    is_expanded: bool,
}

impl Activity {
    /// Creates an inactive, collapsed activity.
    ///
    /// An empty `events` list is replaced by a single default event so the
    /// activity is never empty.
    #[must_use]
    pub fn new(title: impl Into<String>, events: Vec<Event>) -> Self {
        let mut activity = Self {
            id: ActivityId::generate(),
            title: title.into(),
            events,
            is_active: false,
            is_expanded: false,
        };
        activity.ensure_not_empty();
        activity
    }

    /// Creates the activity appended by "add activity".
    #[must_use]
    pub fn new_default() -> Self {
        let mut activity = Self::new(
            NEW_ACTIVITY_TITLE,
            vec![Event::new(FIRST_EVENT_TITLE, StepDuration::ZERO)],
        );
        activity.is_expanded = true;
        activity
    }

    /// The activity a fresh installation starts with.
    #[must_use]
    pub fn builtin_default() -> Self {
        Self::new(
            "Boiled eggs",
            vec![
                Event::new("Put the eggs in water", StepDuration::ZERO),
                Event::new("Boil the water", StepDuration::from_minutes(10)),
                Event::new("Drain the water", StepDuration::ZERO),
                Event::new("Put the eggs in cold water", StepDuration::from_minutes(10)),
            ],
        )
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    /// Index of `event` within this activity.
    pub fn position_of(&self, event: EventId) -> Option<usize> {
        self.events.iter().position(|e| e.id() == event)
    }

    /// The Running or Paused event, if any.
    pub fn active_event(&self) -> Option<&Event> {
        self.events.iter().find(|e| e.is_active())
    }

    /// Number of Running or Paused events.
    pub fn active_event_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_active()).count()
    }

    pub(crate) fn events_mut(&mut self) -> &mut Vec<Event> {
        &mut self.events
    }

    pub(crate) fn event_mut(&mut self, index: usize) -> Option<&mut Event> {
        self.events.get_mut(index)
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Recomputes `is_active` from the events.
    pub(crate) fn refresh_active(&mut self) {
        self.is_active = self.events.iter().any(Event::is_active);
    }

    pub(crate) fn toggle_expanded(&mut self) {
        self.is_expanded = !self.is_expanded;
    }

    pub(crate) fn regenerate_id(&mut self) {
        self.id = ActivityId::generate();
    }

    pub(crate) fn ensure_not_empty(&mut self) {
        if self.events.is_empty() {
            self.events
                .push(Event::new(FIRST_EVENT_TITLE, StepDuration::ZERO));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
