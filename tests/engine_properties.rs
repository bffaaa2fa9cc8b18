//! Behavioural tests for the timer engine.
//!
//! Each test drives a `TimerEngine` through its public operations and ticks,
//! then checks the resulting states, elapsed times and emitted signals.

use tokio::sync::mpsc;

use steptimer::engine::{ActivityStore, Signal, SignalSink, TimerEngine};
use steptimer::model::{Activity, Event, EventId, EventState, StepDuration};
use steptimer::persistence::MemoryRepository;

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    engine: TimerEngine,
    signals: mpsc::UnboundedReceiver<Signal>,
    repository: MemoryRepository,
}

impl Harness {
    fn new(activities: Vec<Activity>) -> Self {
        let (sink, signals) = SignalSink::channel();
        let repository = MemoryRepository::new();
        let engine = TimerEngine::new(
            ActivityStore::from_activities(activities),
            sink,
            Box::new(repository.clone()),
        );
        Self {
            engine,
            signals,
            repository,
        }
    }

    fn single(durations: &[StepDuration]) -> Self {
        Self::new(vec![activity("only", durations)])
    }

    fn event(&self, activity: usize, event: usize) -> EventId {
        self.engine.store().event_id_at(activity, event).unwrap()
    }

    fn state(&self, activity: usize, event: usize) -> EventState {
        let id = self.event(activity, event);
        self.engine.store().event(id).unwrap().state()
    }

    fn elapsed(&self, activity: usize, event: usize) -> u64 {
        let id = self.event(activity, event);
        self.engine.store().event(id).unwrap().elapsed()
    }

    fn is_active(&self, activity: usize) -> bool {
        self.engine.store().activities()[activity].is_active()
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.engine.tick();
            assert!(self.engine.store().invariants_hold());
        }
    }

    fn drain(&mut self) -> Vec<Signal> {
        let mut out = Vec::new();
        while let Ok(signal) = self.signals.try_recv() {
            out.push(signal);
        }
        out
    }
}

fn activity(title: &str, durations: &[StepDuration]) -> Activity {
    let events = durations
        .iter()
        .enumerate()
        .map(|(i, d)| Event::new(format!("{} {}", title, i + 1), *d))
        .collect();
    Activity::new(title, events)
}

fn secs(n: u32) -> StepDuration {
    StepDuration::from_seconds(n)
}

fn count_alerts(signals: &[Signal]) -> usize {
    signals
        .iter()
        .filter(|s| matches!(s, Signal::Alert { .. }))
        .count()
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_at_most_one_active_activity() {
    let mut h = Harness::new(vec![
        activity("a", &[secs(10), secs(10)]),
        activity("b", &[secs(10)]),
        activity("c", &[secs(10), secs(10)]),
    ]);

    let a = h.event(0, 1);
    let b = h.event(1, 0);
    let c = h.event(2, 0);

    h.engine.play(a);
    h.ticks(5);
    h.engine.pause(a);
    h.engine.play(b);
    h.ticks(5);
    h.engine.play(c);

    let active: Vec<bool> = (0..3).map(|i| h.is_active(i)).collect();
    assert_eq!(active, vec![false, false, true]);
    assert_eq!(h.state(0, 1), EventState::Idle);
    assert_eq!(h.elapsed(0, 1), 0);
    assert!(h.engine.store().invariants_hold());
}

#[test]
fn test_at_most_one_active_event_per_activity() {
    let mut h = Harness::single(&[secs(10), secs(10), secs(10)]);

    h.engine.play(h.event(0, 0));
    h.ticks(3);
    h.engine.pause(h.event(0, 0));
    h.engine.play(h.event(0, 2));

    assert_eq!(h.state(0, 0), EventState::Idle);
    assert_eq!(h.state(0, 2), EventState::Running);
    assert_eq!(h.engine.store().activities()[0].active_event_count(), 1);
}

// ============================================================================
// Ticking
// ============================================================================

#[test]
fn test_tick_only_advances_running_events() {
    let mut h = Harness::new(vec![
        activity("a", &[secs(10), secs(10)]),
        activity("b", &[secs(10)]),
    ]);

    h.engine.play(h.event(0, 0));
    h.ticks(7);

    assert_eq!(h.elapsed(0, 0), 7);
    assert_eq!(h.elapsed(0, 1), 0);
    assert_eq!(h.elapsed(1, 0), 0);

    h.engine.pause(h.event(0, 0));
    h.ticks(7);
    assert_eq!(h.elapsed(0, 0), 7);
}

#[test]
fn test_tick_without_running_events_changes_nothing() {
    let mut h = Harness::single(&[secs(1)]);
    let revision = h.engine.store().revision();

    let report = h.engine.tick();

    assert!(!report.changed());
    assert_eq!(h.engine.store().revision(), revision);
    assert_eq!(h.repository.save_count(), 0);
}

#[test]
fn test_changed_tick_persists() {
    let mut h = Harness::single(&[secs(1)]);
    h.engine.play(h.event(0, 0));
    let saves = h.repository.save_count();

    h.ticks(3);

    assert_eq!(h.repository.save_count(), saves + 3);
    let saved = h.repository.saved().unwrap();
    assert_eq!(saved[0].events()[0].elapsed(), 3);
}

// ============================================================================
// Alert
// ============================================================================

#[test]
fn test_alert_fires_once() {
    let mut h = Harness::single(&[StepDuration::from_hundredths(1000)]);
    h.engine.play(h.event(0, 0));
    h.drain();

    h.ticks(499);
    assert!(!h.engine.store().event(h.event(0, 0)).unwrap().alert_triggered());
    assert_eq!(count_alerts(&h.drain()), 0);

    h.ticks(1);
    assert_eq!(h.elapsed(0, 0), 500);
    assert!(h.engine.store().event(h.event(0, 0)).unwrap().alert_triggered());
    assert_eq!(count_alerts(&h.drain()), 1);

    h.ticks(499);
    assert_eq!(h.elapsed(0, 0), 999);
    assert_eq!(count_alerts(&h.drain()), 0);
}

#[test]
fn test_short_event_never_alerts() {
    // Starts with time_left already below the window.
    let mut h = Harness::single(&[StepDuration::from_hundredths(400), secs(60)]);
    h.engine.play(h.event(0, 0));

    h.ticks(400);

    assert_eq!(count_alerts(&h.drain()), 0);
    assert_eq!(h.state(0, 1), EventState::Running);
}

#[test]
fn test_resume_inside_window_does_not_realert() {
    let mut h = Harness::single(&[StepDuration::from_hundredths(1000)]);
    let id = h.event(0, 0);
    h.engine.play(id);
    h.ticks(502);
    h.engine.pause(id);
    h.engine.play(id);
    h.drain();

    h.ticks(10);

    assert_eq!(count_alerts(&h.drain()), 0);
}

// ============================================================================
// Auto-advance
// ============================================================================

#[test]
fn test_zero_duration_runs_indefinitely() {
    let mut h = Harness::single(&[StepDuration::ZERO, secs(1)]);
    h.engine.play(h.event(0, 0));

    h.ticks(10_000);

    assert_eq!(h.state(0, 0), EventState::Running);
    assert_eq!(h.elapsed(0, 0), 10_000);
    assert_eq!(h.state(0, 1), EventState::Idle);
}

#[test]
fn test_completion_advances_to_next_event() {
    let mut h = Harness::single(&[secs(1), secs(2)]);
    h.engine.play(h.event(0, 0));
    h.drain();

    h.ticks(100);

    assert_eq!(h.state(0, 0), EventState::Idle);
    assert_eq!(h.elapsed(0, 0), 0);
    assert!(h.is_active(0));
    assert_eq!(h.state(0, 1), EventState::Running);
    assert_eq!(h.elapsed(0, 1), 0);

    let signals = h.drain();
    let completed = signals
        .iter()
        .position(|s| matches!(s, Signal::Completed { .. }))
        .unwrap();
    let started = signals
        .iter()
        .position(|s| matches!(s, Signal::Started { resumed: false, .. }))
        .unwrap();
    assert!(completed < started);

    h.ticks(1);
    assert_eq!(h.elapsed(0, 1), 1);
}

#[test]
fn test_last_event_completion_deactivates_activity() {
    let mut h = Harness::single(&[secs(1)]);
    h.engine.play(h.event(0, 0));

    h.ticks(100);

    assert_eq!(h.state(0, 0), EventState::Idle);
    assert!(!h.is_active(0));
}

#[test]
fn test_chain_runs_to_the_end() {
    let mut h = Harness::single(&[
        StepDuration::from_hundredths(10),
        StepDuration::from_hundredths(20),
        StepDuration::from_hundredths(30),
    ]);
    h.engine.play(h.event(0, 0));

    h.ticks(10);
    assert_eq!(h.state(0, 1), EventState::Running);
    h.ticks(20);
    assert_eq!(h.state(0, 2), EventState::Running);
    h.ticks(30);

    assert!((0..3).all(|e| h.state(0, e) == EventState::Idle));
    assert!(!h.is_active(0));
}

// ============================================================================
// Operations
// ============================================================================

#[test]
fn test_stop_resets() {
    let mut h = Harness::single(&[StepDuration::from_hundredths(1000)]);
    let id = h.event(0, 0);
    h.engine.play(id);
    h.ticks(600);

    assert!(h.engine.stop(id));

    let event = h.engine.store().event(id).unwrap();
    assert_eq!(event.state(), EventState::Idle);
    assert_eq!(event.elapsed(), 0);
    assert!(!event.alert_triggered());
    assert!(!h.is_active(0));
    assert!(h.drain().contains(&Signal::StopAll));
}

#[test]
fn test_pause_resume_preserves_elapsed() {
    let mut h = Harness::single(&[secs(10)]);
    let id = h.event(0, 0);
    h.engine.play(id);
    h.ticks(30);

    h.engine.pause(id);
    assert_eq!(h.state(0, 0), EventState::Paused);
    assert_eq!(h.elapsed(0, 0), 30);
    assert!(h.is_active(0));

    h.engine.play(id);
    assert_eq!(h.state(0, 0), EventState::Running);
    assert_eq!(h.elapsed(0, 0), 30);

    h.ticks(1);
    assert_eq!(h.elapsed(0, 0), 31);
}

#[test]
fn test_next_and_prev_discard_progress() {
    let mut h = Harness::single(&[secs(10), secs(10)]);
    let first = h.event(0, 0);
    let second = h.event(0, 1);

    h.engine.play(first);
    h.ticks(40);
    assert!(h.engine.next(first));
    assert_eq!(h.elapsed(0, 0), 0);
    assert_eq!(h.state(0, 1), EventState::Running);

    h.ticks(25);
    h.engine.pause(second);
    assert!(h.engine.prev(second));
    assert_eq!(h.elapsed(0, 1), 0);
    assert_eq!(h.state(0, 1), EventState::Idle);
    assert_eq!(h.state(0, 0), EventState::Running);
    assert_eq!(h.elapsed(0, 0), 0);
}

#[test]
fn test_boundary_no_ops() {
    let mut h = Harness::single(&[secs(10), secs(10)]);
    let first = h.event(0, 0);
    let last = h.event(0, 1);
    h.engine.play(last);
    h.ticks(5);
    let revision = h.engine.store().revision();

    assert!(!h.engine.next(last));
    assert!(!h.engine.prev(first));
    assert!(!h.engine.play(last));
    assert!(!h.engine.pause(first));
    assert!(!h.engine.stop(first));

    assert_eq!(h.engine.store().revision(), revision);
    assert_eq!(h.state(0, 1), EventState::Running);
    assert_eq!(h.elapsed(0, 1), 5);
}

#[test]
fn test_non_empty_invariant() {
    let mut h = Harness::single(&[secs(1)]);
    let only = h.engine.store().activity_id_at(0).unwrap();

    assert!(!h.engine.remove_last_event(only));
    assert!(!h.engine.remove_last_activity());
    assert_eq!(h.engine.store().len(), 1);
    assert_eq!(h.engine.store().activities()[0].events().len(), 1);
}

#[test]
fn test_removing_running_tail_event_stops_activity() {
    let mut h = Harness::single(&[secs(1), secs(1)]);
    let activity = h.engine.store().activity_id_at(0).unwrap();
    h.engine.play(h.event(0, 1));
    h.drain();

    assert!(h.engine.remove_last_event(activity));

    assert!(!h.is_active(0));
    assert_eq!(h.drain(), vec![Signal::StopAll]);
    assert!(h.engine.store().invariants_hold());
}

#[test]
fn test_set_duration_keeps_elapsed() {
    let mut h = Harness::single(&[secs(10)]);
    let id = h.event(0, 0);
    h.engine.play(id);
    h.ticks(50);

    h.engine.set_duration(id, StepDuration::from_fields(0, -1, 75, 120));

    let event = h.engine.store().event(id).unwrap();
    assert_eq!(event.duration(), StepDuration::new(0, 0, 59, 99));
    assert_eq!(event.elapsed(), 50);
}

#[test]
fn test_reset_restores_builtin_and_clears_storage() {
    let mut h = Harness::new(vec![activity("a", &[secs(1)]), activity("b", &[secs(1)])]);
    h.engine.play(h.event(1, 0));

    h.engine.reset();

    let store = h.engine.store();
    assert_eq!(store.len(), 1);
    assert_eq!(store.activities()[0].title(), Activity::builtin_default().title());
    assert!(store.active_activity().is_none());
    assert_eq!(h.repository.clear_count(), 1);
    assert!(h.drain().contains(&Signal::StopAll));
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_repairs_saved_state() {
    // Two active events saved by a buggy writer: only the first survives.
    let mut h = Harness::new(vec![activity("a", &[secs(5)]), activity("b", &[secs(5)])]);
    h.engine.play(h.event(0, 0));
    let mut activities = h.engine.store().activities().to_vec();
    let mut other = Harness::new(vec![activity("b", &[secs(5)])]);
    other.engine.play(other.event(0, 0));
    activities[1] = other.engine.store().activities()[0].clone();

    let repository = MemoryRepository::with_activities(activities);
    let (sink, _rx) = SignalSink::channel();
    let engine = TimerEngine::load(Box::new(repository), sink);

    let store = engine.store();
    assert!(store.invariants_hold());
    assert!(store.activities()[0].is_active());
    assert!(!store.activities()[1].is_active());
}

#[test]
fn test_load_failure_falls_back_to_default() {
    let repository = MemoryRepository::new();
    repository.set_should_fail(true);
    let (sink, _rx) = SignalSink::channel();

    let engine = TimerEngine::load(Box::new(repository), sink);

    assert_eq!(engine.store().len(), 1);
    assert_eq!(
        engine.store().activities()[0].title(),
        Activity::builtin_default().title()
    );
}
