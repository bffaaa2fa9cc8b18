//! IPC client for communicating with the step timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling
//!
//! Only connecting is retried. Once a request has been written it is never
//! sent again, since most commands are not idempotent.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::model::DurationInput;
use crate::types::{default_socket_path, ActivityTarget, EventTarget, IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (4MB)
const MAX_RESPONSE_SIZE: u64 = 4 * 1024 * 1024;

/// Maximum connection attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 200;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug, Clone)]
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
    /// Connection attempts before giving up
    max_retries: u32,
}

impl Default for IpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IpcClient {
    /// Creates a new IPC client with default socket path.
    pub fn new() -> Self {
        Self::with_socket_path(default_socket_path())
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
        }
    }

    /// Uses `socket_path` when given, the default otherwise.
    pub fn from_option(socket_path: Option<PathBuf>) -> Self {
        socket_path.map_or_else(Self::new, Self::with_socket_path)
    }

    /// Makes a single connection attempt per request.
    pub fn without_retries(mut self) -> Self {
        self.max_retries = 1;
        self
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    pub async fn status(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Status).await
    }

    pub async fn play(&self, target: EventTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::Play(target)).await
    }

    pub async fn pause(&self, target: EventTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::Pause(target)).await
    }

    pub async fn stop(&self, target: EventTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::Stop(target)).await
    }

    pub async fn next(&self, target: EventTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::Next(target)).await
    }

    pub async fn prev(&self, target: EventTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::Prev(target)).await
    }

    pub async fn play_activity(&self, target: ActivityTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::PlayActivity(target)).await
    }

    pub async fn stop_activity(&self, target: ActivityTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::StopActivity(target)).await
    }

    pub async fn add_activity(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::AddActivity).await
    }

    pub async fn remove_activity(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::RemoveActivity).await
    }

    pub async fn add_event(&self, target: ActivityTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::AddEvent(target)).await
    }

    pub async fn remove_event(&self, target: ActivityTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::RemoveEvent(target)).await
    }

    pub async fn rename(
        &self,
        activity: usize,
        event: Option<usize>,
        title: impl Into<String>,
    ) -> Result<IpcResponse> {
        self.send(&IpcRequest::Rename {
            activity,
            event,
            title: title.into(),
        })
        .await
    }

    pub async fn set_duration(
        &self,
        target: EventTarget,
        input: DurationInput,
    ) -> Result<IpcResponse> {
        self.send(&IpcRequest::SetDuration {
            activity: target.activity,
            event: target.event,
            input,
        })
        .await
    }

    pub async fn toggle(&self, target: ActivityTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::Toggle(target)).await
    }

    pub async fn reset(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Reset).await
    }

    /// Sends a request and fails if the daemon answers with an error.
    pub async fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = self.connect_with_retry().await?;
        let response = Self::exchange(&mut stream, request).await?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }

    /// Connects to the daemon, retrying with a growing delay.
    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut attempt = 1;

        loop {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Connection failed (attempt {}/{}): {:#}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to the daemon at {}. Start it with 'steptimer daemon'",
                    self.socket_path.display()
                )
            })
    }

    /// Writes one request and reads the response until the daemon closes
    /// the connection.
    async fn exchange(stream: &mut UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);

        let request_json = serde_json::to_vec(request).context("Failed to serialize request")?;

        timeout(io_timeout, stream.write_all(&request_json))
            .await
            .context("Write timed out")?
            .context("Failed to send request")?;

        timeout(io_timeout, stream.flush())
            .await
            .context("Flush timed out")?
            .context("Failed to flush request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("Failed to shut down write side")?;

        let mut buffer = Vec::new();
        timeout(
            io_timeout,
            (&mut *stream)
                .take(MAX_RESPONSE_SIZE)
                .read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("No response from the daemon");
        }

        serde_json::from_slice(&buffer).context("Failed to parse response")
    }
}

// ============================================================================
// Tests
// ============================================================================
