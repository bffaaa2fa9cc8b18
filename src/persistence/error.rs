//! Persistence error types.

use thiserror::Error;

/// Errors from loading or saving activities.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The saved file could not be read.
    #[error("Failed to read saved activities: {0}")]
    ReadError(String),

    /// The saved file could not be written or removed.
    #[error("Failed to write saved activities: {0}")]
    WriteError(String),

    /// The saved file is not valid activity JSON.
    #[error("Saved activities are corrupt: {0}")]
    CorruptData(String),

    /// The activities could not be serialized.
    #[error("Failed to serialize activities: {0}")]
    SerializationError(String),

    /// The backing store is not available.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    /// Returns true if the saved data exists but cannot be understood.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData(_))
    }

    /// Returns true if the error came from the filesystem or backing store.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::ReadError(_) | Self::WriteError(_) | Self::Unavailable(_)
        )
    }
}
