//! IPC server for the step timer daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for engine operations
//! - Translation of 1-based positions into activity and event ids
//!
//! One request is served per connection. The daemon closes the connection
//! after writing the response, so clients read until end of stream.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::engine::{ActivityStore, TimerEngine};
use crate::model::{ActivityId, EventId};
use crate::types::{ActivityTarget, EventTarget, IpcRequest, IpcResponse, ResponseData};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// A position does not name an existing activity or event
    #[error("{0}")]
    InvalidTarget(String),
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until the client closes its write half, under a read timeout
    /// and a size cap.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::new();
        let limit = MAX_REQUEST_SIZE as u64 + 1;

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            (&mut *stream).take(limit).read_to_end(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            anyhow::bail!("Connection closed by client");
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest =
            serde_json::from_slice(&buffer).with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Serves a single request on an accepted connection, then closes it.
    ///
    /// Malformed requests get an error response rather than a dropped
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be read or the response
    /// cannot be written.
    pub async fn serve_connection(mut stream: UnixStream, handler: &RequestHandler) -> Result<()> {
        let response = match Self::receive_request(&mut stream).await {
            Ok(request) => {
                debug!("IPC request: {:?}", request);
                handler.handle(request).await
            }
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        };

        Self::send_response(&mut stream, &response).await?;
        stream
            .shutdown()
            .await
            .context("Failed to close connection")?;
        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to TimerEngine.
#[derive(Clone)]
pub struct RequestHandler {
    /// Shared reference to the timer engine
    engine: Arc<Mutex<TimerEngine>>,
}

impl RequestHandler {
    /// Creates a new request handler with the given timer engine.
    pub fn new(engine: Arc<Mutex<TimerEngine>>) -> Self {
        Self { engine }
    }

    /// Handles an IPC request and returns the appropriate response.
    ///
    /// Successful responses always carry the full activity list.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        match apply(&mut engine, request) {
            Ok(message) => {
                IpcResponse::success(message, Some(ResponseData::from_store(engine.store())))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }
}

fn apply(engine: &mut TimerEngine, request: IpcRequest) -> Result<String, IpcError> {
    let message = match request {
        IpcRequest::Status => String::new(),
        IpcRequest::Play(target) => {
            let id = event_id(engine.store(), target)?;
            outcome(engine.play(id), "Event started")
        }
        IpcRequest::Pause(target) => {
            let id = event_id(engine.store(), target)?;
            let was_paused = engine.store().event(id).is_some_and(|e| e.is_paused());
            let message = if was_paused {
                "Event resumed"
            } else {
                "Event paused"
            };
            outcome(engine.pause(id), message)
        }
        IpcRequest::Stop(target) => {
            let id = event_id(engine.store(), target)?;
            outcome(engine.stop(id), "Event stopped")
        }
        IpcRequest::Next(target) => {
            let id = event_id(engine.store(), target)?;
            outcome(engine.next(id), "Moved to the next event")
        }
        IpcRequest::Prev(target) => {
            let id = event_id(engine.store(), target)?;
            outcome(engine.prev(id), "Moved to the previous event")
        }
        IpcRequest::PlayActivity(target) => {
            let id = activity_id(engine.store(), target)?;
            outcome(engine.play_activity(id), "Activity started")
        }
        IpcRequest::StopActivity(target) => {
            let id = activity_id(engine.store(), target)?;
            outcome(engine.stop_activity(id), "Activity stopped")
        }
        IpcRequest::AddActivity => {
            engine.add_activity();
            "Activity added".to_string()
        }
        IpcRequest::RemoveActivity => outcome(engine.remove_last_activity(), "Activity removed"),
        IpcRequest::AddEvent(target) => {
            let id = activity_id(engine.store(), target)?;
            outcome(engine.add_event(id).is_some(), "Event added")
        }
        IpcRequest::RemoveEvent(target) => {
            let id = activity_id(engine.store(), target)?;
            outcome(engine.remove_last_event(id), "Event removed")
        }
        IpcRequest::Rename {
            activity,
            event: Some(event),
            title,
        } => {
            let id = event_id(engine.store(), EventTarget::new(activity, event))?;
            outcome(engine.rename_event(id, title), "Event renamed")
        }
        IpcRequest::Rename {
            activity,
            event: None,
            title,
        } => {
            let id = activity_id(engine.store(), ActivityTarget::new(activity))?;
            outcome(engine.rename_activity(id, title), "Activity renamed")
        }
        IpcRequest::SetDuration {
            activity,
            event,
            input,
        } => {
            let id = event_id(engine.store(), EventTarget::new(activity, event))?;
            let current = engine
                .store()
                .event(id)
                .map(|e| e.duration())
                .unwrap_or_default();
            outcome(engine.set_duration(id, input.apply_to(current)), "Duration updated")
        }
        IpcRequest::Toggle(target) => {
            let id = activity_id(engine.store(), target)?;
            outcome(engine.toggle_expanded(id), "Activity toggled")
        }
        IpcRequest::Reset => {
            engine.reset();
            "Activities reset".to_string()
        }
    };

    Ok(message)
}

fn outcome(changed: bool, message: &str) -> String {
    if changed {
        message.to_string()
    } else {
        "Nothing changed".to_string()
    }
}

fn activity_index(store: &ActivityStore, position: usize) -> Result<usize, IpcError> {
    match position.checked_sub(1) {
        Some(index) if index < store.len() => Ok(index),
        _ => Err(IpcError::InvalidTarget(format!(
            "Activity {} does not exist (1-{})",
            position,
            store.len()
        ))),
    }
}

fn activity_id(store: &ActivityStore, target: ActivityTarget) -> Result<ActivityId, IpcError> {
    let index = activity_index(store, target.activity)?;
    store
        .activity_id_at(index)
        .ok_or_else(|| IpcError::InvalidTarget(format!("Activity {} does not exist", target.activity)))
}

fn event_id(store: &ActivityStore, target: EventTarget) -> Result<EventId, IpcError> {
    let index = activity_index(store, target.activity)?;
    target
        .event
        .checked_sub(1)
        .and_then(|event| store.event_id_at(index, event))
        .ok_or_else(|| {
            IpcError::InvalidTarget(format!(
                "Event {} of activity {} does not exist",
                target.event, target.activity
            ))
        })
}

// ============================================================================
// Tests
// ============================================================================
