//! The ordered collection of activities.
//!
//! `ActivityStore` owns every activity and event, keeps an id index so the
//! engine can find entities without scanning, and guarantees the collection
//! is never empty. Removal only happens at the tail, so recorded positions
//! stay valid for every entity that remains.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::model::{Activity, ActivityId, Event, EventId};

// ============================================================================
// EventLocation
// ============================================================================

/// Position of an event inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventLocation {
    /// Index of the owning activity.
    pub activity: usize,
    /// Index of the event within that activity.
    pub event: usize,
}

// ============================================================================
// ActivityStore
// ============================================================================

/// Process-wide set of activities.
#[derive(Debug, Clone)]
pub struct ActivityStore {
    activities: Vec<Activity>,
    activity_index: HashMap<ActivityId, usize>,
    event_index: HashMap<EventId, EventLocation>,
    /// Bumped by every mutation so views can tell when to re-render.
    revision: u64,
}

impl Default for ActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityStore {
    /// Creates a store holding only the built-in default activity.
    #[must_use]
    pub fn new() -> Self {
        Self::from_activities(Vec::new())
    }

    /// Creates a store from previously persisted activities.
    ///
    /// Loaded data is repaired rather than rejected: an empty list becomes the
    /// built-in default, empty activities get an event, duplicate ids are
    /// replaced, and if more than one event is Running or Paused only the
    /// first one (in collection order) is kept active.
    #[must_use]
    pub fn from_activities(activities: Vec<Activity>) -> Self {
        let mut store = Self {
            activities,
            activity_index: HashMap::new(),
            event_index: HashMap::new(),
            revision: 0,
        };
        store.normalize();
        store.rebuild_index();
        store
    }

    fn normalize(&mut self) {
        if self.activities.is_empty() {
            self.activities.push(Activity::builtin_default());
        }

        let mut seen_activities = HashSet::new();
        let mut seen_events = HashSet::new();
        let mut found_active = false;

        for activity in &mut self.activities {
            activity.ensure_not_empty();

            if !seen_activities.insert(activity.id()) {
                warn!("Duplicate activity id {}, assigning a new one", activity.id());
                activity.regenerate_id();
                seen_activities.insert(activity.id());
            }

            for event in activity.events_mut() {
                if !seen_events.insert(event.id()) {
                    warn!("Duplicate event id {}, assigning a new one", event.id());
                    event.regenerate_id();
                    seen_events.insert(event.id());
                }

                if event.is_active() {
                    if found_active {
                        warn!("Resetting extra active event '{}'", event.title());
                        event.reset();
                    } else {
                        found_active = true;
                    }
                }
            }

            activity.refresh_active();
        }
    }

    fn rebuild_index(&mut self) {
        self.activity_index.clear();
        self.event_index.clear();

        for (a, activity) in self.activities.iter().enumerate() {
            self.activity_index.insert(activity.id(), a);
            for (e, event) in activity.events().iter().enumerate() {
                self.event_index
                    .insert(event.id(), EventLocation { activity: a, event: e });
            }
        }
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    /// All activities, in order.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.locate_activity(id).map(|a| &self.activities[a])
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.locate_event(id)
            .map(|loc| &self.activities[loc.activity].events()[loc.event])
    }

    pub fn locate_activity(&self, id: ActivityId) -> Option<usize> {
        self.activity_index.get(&id).copied()
    }

    pub fn locate_event(&self, id: EventId) -> Option<EventLocation> {
        self.event_index.get(&id).copied()
    }

    /// Id of the activity at a zero-based position.
    pub fn activity_id_at(&self, position: usize) -> Option<ActivityId> {
        self.activities.get(position).map(Activity::id)
    }

    /// Id of the event at zero-based positions.
    pub fn event_id_at(&self, activity: usize, event: usize) -> Option<EventId> {
        self.activities
            .get(activity)
            .and_then(|a| a.events().get(event))
            .map(Event::id)
    }

    /// The active activity, if any.
    pub fn active_activity(&self) -> Option<&Activity> {
        self.activities.iter().find(|a| a.is_active())
    }

    /// Locations of every Running event, in collection order.
    pub fn running_events(&self) -> Vec<EventLocation> {
        self.activities
            .iter()
            .enumerate()
            .flat_map(|(a, activity)| {
                activity
                    .events()
                    .iter()
                    .enumerate()
                    .filter(|(_, event)| event.is_running())
                    .map(move |(e, _)| EventLocation { activity: a, event: e })
            })
            .collect()
    }

    /// Checks the one-active-activity and one-active-event rules, plus the
    /// agreement between `is_active` and event states.
    pub fn invariants_hold(&self) -> bool {
        let active_activities = self.activities.iter().filter(|a| a.is_active()).count();
        let flags_agree = self
            .activities
            .iter()
            .all(|a| a.is_active() == (a.active_event_count() > 0));
        let single_event = self.activities.iter().all(|a| a.active_event_count() <= 1);
        let never_empty =
            !self.activities.is_empty() && self.activities.iter().all(|a| !a.events().is_empty());

        active_activities <= 1 && flags_agree && single_event && never_empty
    }

    // ------------------------------------------------------------------------
    // Mutation (engine only)
    // ------------------------------------------------------------------------

    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub(crate) fn activity_mut(&mut self, index: usize) -> Option<&mut Activity> {
        self.activities.get_mut(index)
    }

    pub(crate) fn event_mut(&mut self, location: EventLocation) -> Option<&mut Event> {
        self.activities
            .get_mut(location.activity)
            .and_then(|a| a.event_mut(location.event))
    }

    pub(crate) fn push_activity(&mut self, activity: Activity) -> ActivityId {
        let id = activity.id();
        let a = self.activities.len();
        self.activity_index.insert(id, a);
        for (e, event) in activity.events().iter().enumerate() {
            self.event_index
                .insert(event.id(), EventLocation { activity: a, event: e });
        }
        self.activities.push(activity);
        id
    }

    /// Removes the last activity unless it is the only one.
    pub(crate) fn pop_activity(&mut self) -> Option<Activity> {
        if self.activities.len() <= 1 {
            return None;
        }
        let activity = self.activities.pop()?;
        self.activity_index.remove(&activity.id());
        for event in activity.events() {
            self.event_index.remove(&event.id());
        }
        Some(activity)
    }

    pub(crate) fn push_event(&mut self, activity: usize, event: Event) -> Option<EventId> {
        let target = self.activities.get_mut(activity)?;
        let id = event.id();
        let e = target.events().len();
        target.events_mut().push(event);
        self.event_index
            .insert(id, EventLocation { activity, event: e });
        Some(id)
    }

    /// Removes the last event of an activity unless it is the only one.
    pub(crate) fn pop_event(&mut self, activity: usize) -> Option<Event> {
        let target = self.activities.get_mut(activity)?;
        if target.events().len() <= 1 {
            return None;
        }
        let event = target.events_mut().pop()?;
        self.event_index.remove(&event.id());
        Some(event)
    }

    /// Replaces every activity, keeping the revision counter.
    pub(crate) fn replace_all(&mut self, activities: Vec<Activity>) {
        self.activities = activities;
        self.normalize();
        self.rebuild_index();
    }
}

// ============================================================================
// Tests
// ============================================================================
