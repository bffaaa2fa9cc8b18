//! Timer engine.
//!
//! This module provides the core timer functionality:
//! - One tick per hundredth of a second with tokio::time::interval
//! - Near-completion alert, fired once per run
//! - Completion and auto-advance to the next event
//! - Persisting the store after every mutation

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::model::{ActivityId, EventId, StepDuration};
use crate::persistence::ActivityRepository;

use super::controller::EventController;
use super::signal::{Signal, SignalSink};
use super::store::ActivityStore;

// ============================================================================
// Constants
// ============================================================================

/// Nominal tick period: one hundredth of a second.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Upper edge (inclusive) of the alert window, in hundredths left.
pub const ALERT_WINDOW_UPPER: i64 = 500;

/// Lower edge (exclusive) of the alert window, in hundredths left.
pub const ALERT_WINDOW_LOWER: i64 = 495;

/// Returns true if `time_left` lies in the near-completion alert window.
///
/// The window is a few ticks wide because ticks are discrete; a stall of
/// more than five ticks around the threshold skips the alert.
pub fn in_alert_window(time_left: i64) -> bool {
    time_left > ALERT_WINDOW_LOWER && time_left <= ALERT_WINDOW_UPPER
}

// ============================================================================
// TickReport
// ============================================================================

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Events whose elapsed time advanced.
    pub advanced: usize,
    /// Alerts fired.
    pub alerts: usize,
    /// Events that reached their duration.
    pub completions: usize,
}

impl TickReport {
    /// Returns true if the tick changed any state.
    pub fn changed(&self) -> bool {
        self.advanced > 0
    }
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Owns the activity store and drives it from ticks and user operations.
pub struct TimerEngine {
    /// All activities
    store: ActivityStore,
    /// Signal sender
    signals: SignalSink,
    /// Where the store is saved after each mutation
    repository: Box<dyn ActivityRepository>,
}

impl TimerEngine {
    /// Creates an engine around an existing store.
    pub fn new(
        store: ActivityStore,
        signals: SignalSink,
        repository: Box<dyn ActivityRepository>,
    ) -> Self {
        Self {
            store,
            signals,
            repository,
        }
    }

    /// Creates an engine from whatever the repository holds.
    ///
    /// Unreadable or empty saved state falls back to the built-in default.
    pub fn load(repository: Box<dyn ActivityRepository>, signals: SignalSink) -> Self {
        let activities = match repository.load() {
            Ok(activities) => {
                if activities.is_empty() {
                    info!("No saved activities, starting with the built-in default");
                }
                activities
            }
            Err(e) => {
                warn!("Could not load saved activities, using the built-in default: {}", e);
                Vec::new()
            }
        };

        Self::new(ActivityStore::from_activities(activities), signals, repository)
    }

    /// Returns the current store.
    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    /// Advances every running event by one hundredth of a second.
    ///
    /// Only events running when the tick begins are advanced; an event
    /// started by auto-advance waits for the next tick.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for location in self.store.running_events() {
            let Some(activity_id) = self.store.activity_id_at(location.activity) else {
                continue;
            };
            let Some(event) = self.store.event_mut(location) else {
                continue;
            };
            if !event.is_running() {
                continue;
            }

            let elapsed = event.advance();
            report.advanced += 1;

            let total = event.duration().total_hundredths();
            let event_id = event.id();

            if in_alert_window(event.time_left()) && !event.alert_triggered() {
                event.mark_alert_triggered();
                report.alerts += 1;
                debug!("Alert for '{}' at {}", event.title(), elapsed);
                self.signals.emit(Signal::Alert {
                    activity: activity_id,
                    event: event_id,
                });
            }

            if total > 0 && elapsed >= total {
                report.completions += 1;
                debug!("Completed '{}' after {}", event.title(), elapsed);
                self.signals.emit(Signal::Completed {
                    activity: activity_id,
                    event: event_id,
                });
                EventController::new(&mut self.store, &self.signals).complete_at(location);
            }
        }

        if report.changed() {
            self.commit(true);
        }
        report
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    pub fn play(&mut self, id: EventId) -> bool {
        let changed = self.controller().play(id);
        self.commit(changed)
    }

    pub fn pause(&mut self, id: EventId) -> bool {
        let changed = self.controller().pause(id);
        self.commit(changed)
    }

    pub fn stop(&mut self, id: EventId) -> bool {
        let changed = self.controller().stop(id);
        self.commit(changed)
    }

    pub fn next(&mut self, id: EventId) -> bool {
        let changed = self.controller().next(id);
        self.commit(changed)
    }

    pub fn prev(&mut self, id: EventId) -> bool {
        let changed = self.controller().prev(id);
        self.commit(changed)
    }

    pub fn play_activity(&mut self, id: ActivityId) -> bool {
        let changed = self.controller().play_activity(id);
        self.commit(changed)
    }

    pub fn stop_activity(&mut self, id: ActivityId) -> bool {
        let changed = self.controller().stop_activity(id);
        self.commit(changed)
    }

    pub fn add_activity(&mut self) -> ActivityId {
        let id = self.controller().add_activity();
        self.commit(true);
        id
    }

    pub fn remove_last_activity(&mut self) -> bool {
        let changed = self.controller().remove_last_activity();
        self.commit(changed)
    }

    pub fn add_event(&mut self, activity: ActivityId) -> Option<EventId> {
        let id = self.controller().add_event(activity);
        self.commit(id.is_some());
        id
    }

    pub fn remove_last_event(&mut self, activity: ActivityId) -> bool {
        let changed = self.controller().remove_last_event(activity);
        self.commit(changed)
    }

    pub fn rename_activity(&mut self, id: ActivityId, title: impl Into<String>) -> bool {
        let changed = self.controller().rename_activity(id, title);
        self.commit(changed)
    }

    pub fn rename_event(&mut self, id: EventId, title: impl Into<String>) -> bool {
        let changed = self.controller().rename_event(id, title);
        self.commit(changed)
    }

    pub fn set_duration(&mut self, id: EventId, duration: StepDuration) -> bool {
        let changed = self.controller().set_duration(id, duration);
        self.commit(changed)
    }

    pub fn toggle_expanded(&mut self, id: ActivityId) -> bool {
        let changed = self.controller().toggle_expanded(id);
        self.commit(changed)
    }

    /// Discards all activities and saved state and starts over from the
    /// built-in default.
    pub fn reset(&mut self) {
        self.controller().reset();
        if let Err(e) = self.repository.clear() {
            warn!("Failed to clear saved activities: {}", e);
        }
        self.commit(true);
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn controller(&mut self) -> EventController<'_> {
        EventController::new(&mut self.store, &self.signals)
    }

    fn commit(&mut self, changed: bool) -> bool {
        if changed {
            self.store.touch();
            self.persist();
        }
        changed
    }

    fn persist(&self) {
        if let Err(e) = self.repository.save(self.store.activities()) {
            warn!("Failed to save activities: {}", e);
        }
    }
}

/// Ticks a shared engine until the task is dropped.
///
/// Each tick runs to completion under the lock, so user operations never
/// observe a half-applied tick. Missed ticks are skipped, not replayed.
pub async fn run_ticker(engine: Arc<Mutex<TimerEngine>>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let report = engine.lock().await.tick();
        if report.completions > 0 {
            debug!("Tick completed {} event(s)", report.completions);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
