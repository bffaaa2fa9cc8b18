//! State-machine operations on events and activities.
//!
//! Every operation is a no-op (returning `false`) when its precondition does
//! not hold or its target id is unknown. Starting an event first stops any
//! other active activity and any other active event of the same activity,
//! so at most one activity and one event are ever active.

use tracing::debug;

use crate::model::{Activity, ActivityId, Event, EventId, EventState, StepDuration};

use super::signal::{Signal, SignalSink};
use super::store::{ActivityStore, EventLocation};

/// Direction for [`EventController::next`] and [`EventController::prev`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Backward,
}

/// Applies user and engine operations to an [`ActivityStore`].
pub struct EventController<'a> {
    store: &'a mut ActivityStore,
    signals: &'a SignalSink,
}

impl<'a> EventController<'a> {
    pub fn new(store: &'a mut ActivityStore, signals: &'a SignalSink) -> Self {
        Self { store, signals }
    }

    // ------------------------------------------------------------------------
    // Event operations
    // ------------------------------------------------------------------------

    /// Starts an idle event, or resumes a paused one.
    pub fn play(&mut self, id: EventId) -> bool {
        let Some(location) = self.store.locate_event(id) else {
            return false;
        };

        match self.state_at(location) {
            Some(EventState::Idle) => {
                self.start_at(location, false);
                true
            }
            Some(EventState::Paused) => {
                self.start_at(location, true);
                true
            }
            Some(EventState::Running) | None => false,
        }
    }

    /// Pauses a running event; on a paused event this resumes it.
    pub fn pause(&mut self, id: EventId) -> bool {
        let Some(location) = self.store.locate_event(id) else {
            return false;
        };

        match self.state_at(location) {
            Some(EventState::Running) => {
                if let Some(event) = self.store.event_mut(location) {
                    event.pause();
                    debug!("Paused '{}' at {}", event.title(), event.elapsed());
                }
                self.signals.emit(Signal::StopAll);
                true
            }
            Some(EventState::Paused) => {
                self.start_at(location, true);
                true
            }
            Some(EventState::Idle) | None => false,
        }
    }

    /// Stops a running or paused event.
    pub fn stop(&mut self, id: EventId) -> bool {
        let Some(location) = self.store.locate_event(id) else {
            return false;
        };

        match self.state_at(location) {
            Some(state) if state.is_active() => {
                self.stop_at(location);
                true
            }
            _ => false,
        }
    }

    /// Abandons the current event and starts the following one from zero.
    ///
    /// Only a running or paused event can be stepped away from.
    pub fn next(&mut self, id: EventId) -> bool {
        match self.active_location(id) {
            Some(location) => self.step_from(location, Step::Forward),
            None => false,
        }
    }

    /// Abandons the current event and starts the preceding one from zero.
    pub fn prev(&mut self, id: EventId) -> bool {
        match self.active_location(id) {
            Some(location) => self.step_from(location, Step::Backward),
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Activity operations
    // ------------------------------------------------------------------------

    /// Starts the first event of an activity from zero, or resumes it if paused.
    pub fn play_activity(&mut self, id: ActivityId) -> bool {
        let Some(activity) = self.store.locate_activity(id) else {
            return false;
        };

        let first = EventLocation { activity, event: 0 };
        if self.state_at(first) == Some(EventState::Paused) {
            self.start_at(first, true);
            return true;
        }
        if let Some(event) = self.store.event_mut(first) {
            event.reset();
        }
        self.start_at(first, false);
        true
    }

    /// Stops every event of an active activity.
    pub fn stop_activity(&mut self, id: ActivityId) -> bool {
        match self.store.locate_activity(id) {
            Some(activity) => self.stop_activity_at(activity),
            None => false,
        }
    }

    /// Appends a new default activity.
    pub fn add_activity(&mut self) -> ActivityId {
        let id = self.store.push_activity(Activity::new_default());
        debug!("Added activity {}", id);
        id
    }

    /// Removes the last activity unless it is the only one.
    pub fn remove_last_activity(&mut self) -> bool {
        match self.store.pop_activity() {
            Some(removed) => {
                debug!("Removed activity '{}'", removed.title());
                if removed.is_active() {
                    self.signals.emit(Signal::StopAll);
                }
                true
            }
            None => false,
        }
    }

    /// Appends a new default event to an activity.
    pub fn add_event(&mut self, activity: ActivityId) -> Option<EventId> {
        let index = self.store.locate_activity(activity)?;
        let id = self.store.push_event(index, Event::new_default())?;
        debug!("Added event {} to activity {}", id, activity);
        Some(id)
    }

    /// Removes the last event of an activity unless it is the only one.
    pub fn remove_last_event(&mut self, activity: ActivityId) -> bool {
        let Some(index) = self.store.locate_activity(activity) else {
            return false;
        };
        let Some(removed) = self.store.pop_event(index) else {
            return false;
        };

        debug!("Removed event '{}'", removed.title());
        if removed.is_active() {
            if let Some(owner) = self.store.activity_mut(index) {
                owner.refresh_active();
            }
            self.signals.emit(Signal::StopAll);
        }
        true
    }

    pub fn rename_activity(&mut self, id: ActivityId, title: impl Into<String>) -> bool {
        let Some(index) = self.store.locate_activity(id) else {
            return false;
        };
        match self.store.activity_mut(index) {
            Some(activity) => {
                activity.set_title(title.into());
                true
            }
            None => false,
        }
    }

    pub fn rename_event(&mut self, id: EventId, title: impl Into<String>) -> bool {
        let Some(location) = self.store.locate_event(id) else {
            return false;
        };
        match self.store.event_mut(location) {
            Some(event) => {
                event.set_title(title.into());
                true
            }
            None => false,
        }
    }

    /// Sets an event's duration. Elapsed time is left as is.
    pub fn set_duration(&mut self, id: EventId, duration: StepDuration) -> bool {
        let Some(location) = self.store.locate_event(id) else {
            return false;
        };
        match self.store.event_mut(location) {
            Some(event) => {
                event.set_duration(duration);
                true
            }
            None => false,
        }
    }

    pub fn toggle_expanded(&mut self, id: ActivityId) -> bool {
        let Some(index) = self.store.locate_activity(id) else {
            return false;
        };
        match self.store.activity_mut(index) {
            Some(activity) => {
                activity.toggle_expanded();
                true
            }
            None => false,
        }
    }

    /// Stops everything and replaces all activities by the built-in default.
    pub fn reset(&mut self) {
        self.signals.emit(Signal::StopAll);
        self.store.replace_all(Vec::new());
        debug!("Store reset to the built-in default");
    }

    // ------------------------------------------------------------------------
    // Engine entry points
    // ------------------------------------------------------------------------

    /// Handles a timed event reaching its duration: stop it, then move on.
    pub(crate) fn complete_at(&mut self, location: EventLocation) {
        self.stop_at(location);
        self.step_from(location, Step::Forward);
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn active_location(&self, id: EventId) -> Option<EventLocation> {
        self.store
            .locate_event(id)
            .filter(|&location| self.state_at(location).is_some_and(|state| state.is_active()))
    }

    fn state_at(&self, location: EventLocation) -> Option<EventState> {
        self.store
            .activities()
            .get(location.activity)
            .and_then(|a| a.events().get(location.event))
            .map(Event::state)
    }

    fn start_at(&mut self, location: EventLocation, resume: bool) {
        self.stop_other_activities(location.activity);
        self.stop_sibling_events(location);

        let Some(activity) = self.store.activity_mut(location.activity) else {
            return;
        };
        let activity_id = activity.id();
        let Some(event) = activity.event_mut(location.event) else {
            return;
        };

        if resume {
            event.resume();
        } else {
            event.start_fresh();
        }
        let event_id = event.id();
        debug!(
            "{} '{}' at {}",
            if resume { "Resumed" } else { "Started" },
            event.title(),
            event.elapsed()
        );
        activity.set_active(true);

        self.signals.emit(Signal::Started {
            activity: activity_id,
            event: event_id,
            resumed: resume,
        });
    }

    pub(crate) fn stop_at(&mut self, location: EventLocation) {
        let Some(activity) = self.store.activity_mut(location.activity) else {
            return;
        };
        if let Some(event) = activity.event_mut(location.event) {
            event.reset();
            debug!("Stopped '{}'", event.title());
        }
        activity.refresh_active();
        self.signals.emit(Signal::StopAll);
    }

    fn stop_activity_at(&mut self, index: usize) -> bool {
        let Some(activity) = self.store.activity_mut(index) else {
            return false;
        };
        if !activity.is_active() {
            return false;
        }

        for event in activity.events_mut().iter_mut() {
            if event.is_active() {
                event.reset();
            }
        }
        activity.set_active(false);
        debug!("Stopped activity '{}'", activity.title());

        self.signals.emit(Signal::StopAll);
        true
    }

    fn stop_other_activities(&mut self, keep: usize) {
        let others: Vec<usize> = self
            .store
            .activities()
            .iter()
            .enumerate()
            .filter(|(index, activity)| *index != keep && activity.is_active())
            .map(|(index, _)| index)
            .collect();

        for index in others {
            self.stop_activity_at(index);
        }
    }

    fn stop_sibling_events(&mut self, location: EventLocation) {
        let siblings: Vec<usize> = self
            .store
            .activities()
            .get(location.activity)
            .map(|activity| {
                activity
                    .events()
                    .iter()
                    .enumerate()
                    .filter(|(index, event)| *index != location.event && event.is_active())
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default();

        for event in siblings {
            self.stop_at(EventLocation {
                activity: location.activity,
                event,
            });
        }
    }

    fn step_from(&mut self, location: EventLocation, step: Step) -> bool {
        let Some(len) = self
            .store
            .activities()
            .get(location.activity)
            .map(|a| a.events().len())
        else {
            return false;
        };

        let target = match step {
            Step::Forward if location.event + 1 < len => location.event + 1,
            Step::Backward if location.event > 0 => location.event - 1,
            _ => return false,
        };
        let target = EventLocation {
            activity: location.activity,
            event: target,
        };

        // Progress of both the current and the target event is discarded.
        if let Some(current) = self.store.event_mut(location) {
            current.reset();
        }
        if let Some(next) = self.store.event_mut(target) {
            next.reset();
        }
        self.start_at(target, false);
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
