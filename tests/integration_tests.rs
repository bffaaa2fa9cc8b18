//! Integration tests for daemon-CLI IPC communication and persistence.
//!
//! These tests run the real IPC server against the real client over a
//! temporary Unix socket:
//! - Activity start, pause and status via IPC
//! - Structure edits via IPC
//! - Error responses for unknown positions
//! - Connection error handling
//! - Saved state surviving an engine restart

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use steptimer::cli::client::IpcClient;
use steptimer::daemon::{self, IpcServer, RequestHandler};
use steptimer::engine::{ActivityStore, SignalSink, TimerEngine};
use steptimer::model::{DurationInput, EventState, StepDuration};
use steptimer::persistence::{ActivityRepository, JsonFileRepository, MemoryRepository};
use steptimer::types::{ActivityTarget, EventTarget};

// ============================================================================
// Test Helpers
// ============================================================================

/// A served engine plus the handles needed to drive and stop it.
struct TestDaemon {
    _dir: tempfile::TempDir,
    socket_path: PathBuf,
    engine: Arc<Mutex<TimerEngine>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestDaemon {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("integration_test.sock");

        let (sink, _rx) = SignalSink::channel();
        let engine = Arc::new(Mutex::new(TimerEngine::new(
            ActivityStore::new(),
            sink,
            Box::new(MemoryRepository::new()),
        )));

        let server = IpcServer::new(&socket_path).unwrap();
        let handler = RequestHandler::new(Arc::clone(&engine));
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(daemon::serve(server, handler, async {
            let _ = signal.await;
        }));

        Self {
            _dir: dir,
            socket_path,
            engine,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    fn client(&self) -> IpcClient {
        IpcClient::with_socket_path(self.socket_path.clone())
    }

    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            timeout(Duration::from_secs(5), task)
                .await
                .expect("server did not stop")
                .unwrap();
        }
    }
}

// ============================================================================
// IPC Tests
// ============================================================================

#[tokio::test]
async fn test_status_via_ipc() {
    let daemon = TestDaemon::start();

    let response = daemon.client().status().await.unwrap();

    let data = response.data.unwrap();
    assert_eq!(data.activities.len(), 1);
    assert_eq!(data.activities[0].title(), "Boiled eggs");
    assert_eq!(data.activities[0].events().len(), 4);

    daemon.stop().await;
}

#[tokio::test]
async fn test_start_pause_status_via_ipc() {
    let daemon = TestDaemon::start();
    let client = daemon.client();

    let response = client.play_activity(ActivityTarget::new(1)).await.unwrap();
    assert_eq!(response.message, "Activity started");

    {
        let mut engine = daemon.engine.lock().await;
        for _ in 0..25 {
            engine.tick();
        }
    }

    let response = client.pause(EventTarget::new(1, 1)).await.unwrap();
    assert_eq!(response.message, "Event paused");

    let data = client.status().await.unwrap().data.unwrap();
    let event = &data.activities[0].events()[0];
    assert_eq!(event.state(), EventState::Paused);
    assert_eq!(event.elapsed(), 25);
    assert!(data.activities[0].is_active());

    daemon.stop().await;
}

#[tokio::test]
async fn test_revision_tracks_changes() {
    let daemon = TestDaemon::start();
    let client = daemon.client();

    let before = client.status().await.unwrap().data.unwrap().revision;
    let again = client.status().await.unwrap().data.unwrap().revision;
    assert_eq!(before, again);

    client.toggle(ActivityTarget::new(1)).await.unwrap();
    let after = client.status().await.unwrap().data.unwrap().revision;
    assert_ne!(before, after);

    daemon.stop().await;
}

#[tokio::test]
async fn test_structure_edits_via_ipc() {
    let daemon = TestDaemon::start();
    let client = daemon.client();

    client.add_activity().await.unwrap();
    client.add_event(ActivityTarget::new(2)).await.unwrap();
    client.rename(2, None, "Pasta").await.unwrap();
    client.rename(2, Some(2), "Boil").await.unwrap();
    let response = client
        .set_duration(
            EventTarget::new(2, 2),
            DurationInput {
                minutes: Some("9".to_string()),
                seconds: Some("oops".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let data = response.data.unwrap();
    let pasta = &data.activities[1];
    assert_eq!(pasta.title(), "Pasta");
    assert_eq!(pasta.events()[0].title(), "Warm-up");
    assert_eq!(pasta.events()[1].title(), "Boil");
    assert_eq!(pasta.events()[1].duration(), StepDuration::new(0, 9, 0, 0));

    client.remove_activity().await.unwrap();
    let data = client.status().await.unwrap().data.unwrap();
    assert_eq!(data.activities.len(), 1);

    daemon.stop().await;
}

#[tokio::test]
async fn test_unknown_position_is_an_error() {
    let daemon = TestDaemon::start();

    let err = daemon
        .client()
        .play(EventTarget::new(1, 9))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    daemon.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients() {
    let daemon = TestDaemon::start();

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let client = daemon.client();
        tasks.push(tokio::spawn(async move { client.add_activity().await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let data = daemon.client().status().await.unwrap().data.unwrap();
    assert_eq!(data.activities.len(), 6);

    daemon.stop().await;
}

#[tokio::test]
async fn test_connection_error_without_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let client = IpcClient::with_socket_path(dir.path().join("missing.sock")).without_retries();

    let result = timeout(Duration::from_secs(10), client.status()).await.unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_socket_removed_after_shutdown() {
    let daemon = TestDaemon::start();
    let socket_path = daemon.socket_path.clone();
    assert!(socket_path.exists());

    daemon.stop().await;

    assert!(!socket_path.exists());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.json");

    {
        let (sink, _rx) = SignalSink::channel();
        let mut engine = TimerEngine::load(Box::new(JsonFileRepository::new(&path)), sink);
        let activity = engine.add_activity();
        let event = engine.add_event(activity).unwrap();
        engine.rename_event(event, "Stir");
        engine.play(event);
        for _ in 0..42 {
            engine.tick();
        }
    }

    let (sink, _rx) = SignalSink::channel();
    let engine = TimerEngine::load(Box::new(JsonFileRepository::new(&path)), sink);
    let store = engine.store();

    assert_eq!(store.len(), 2);
    let restored = &store.activities()[1];
    assert!(restored.is_active());
    assert_eq!(restored.events()[1].title(), "Stir");
    assert_eq!(restored.events()[1].state(), EventState::Running);
    assert_eq!(restored.events()[1].elapsed(), 42);
}

#[test]
fn test_corrupt_file_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.json");
    std::fs::write(&path, "[{\"broken\": ").unwrap();

    let repository = JsonFileRepository::new(&path);
    assert!(repository.load().unwrap_err().is_corrupt());

    let (sink, _rx) = SignalSink::channel();
    let engine = TimerEngine::load(Box::new(repository), sink);
    assert_eq!(engine.store().len(), 1);
    assert_eq!(engine.store().activities()[0].title(), "Boiled eggs");
}

#[test]
fn test_reset_deletes_saved_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.json");

    let (sink, _rx) = SignalSink::channel();
    let mut engine = TimerEngine::load(Box::new(JsonFileRepository::new(&path)), sink);
    engine.add_activity();
    assert!(path.exists());

    engine.reset();

    let saved = JsonFileRepository::new(&path).load().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].title(), "Boiled eggs");
}
