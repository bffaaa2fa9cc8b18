//! Saving and restoring activities.
//!
//! Persistence is best effort: the engine logs failures and carries on with
//! its in-memory state.

mod error;
mod json;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use error::PersistenceError;
pub use json::JsonFileRepository;

use crate::model::Activity;

/// Storage for the activity list.
pub trait ActivityRepository: Send {
    /// Returns the saved activities, or an empty list if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if saved data exists but cannot be read.
    fn load(&self) -> Result<Vec<Activity>, PersistenceError>;

    /// Replaces the saved activities.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be written.
    fn save(&self, activities: &[Activity]) -> Result<(), PersistenceError>;

    /// Forgets everything saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved data cannot be removed.
    fn clear(&self) -> Result<(), PersistenceError>;
}

/// In-memory repository for tests.
///
/// Clones share the same storage, so a test can keep one handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    saved: Arc<Mutex<Option<Vec<Activity>>>>,
    save_count: Arc<AtomicUsize>,
    clear_count: Arc<AtomicUsize>,
    should_fail: Arc<AtomicBool>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_activities(activities: Vec<Activity>) -> Self {
        let repository = Self::new();
        *repository.slot() = Some(activities);
        repository
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// The most recently saved activities.
    #[must_use]
    pub fn saved(&self) -> Option<Vec<Activity>> {
        self.slot().clone()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clear_count.load(Ordering::SeqCst)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Vec<Activity>>> {
        self.saved.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("Mock failure".to_string()));
        }
        Ok(())
    }
}

impl ActivityRepository for MemoryRepository {
    fn load(&self) -> Result<Vec<Activity>, PersistenceError> {
        self.check_available()?;
        Ok(self.saved().unwrap_or_default())
    }

    fn save(&self, activities: &[Activity]) -> Result<(), PersistenceError> {
        self.check_available()?;
        *self.slot() = Some(activities.to_vec());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.check_available()?;
        *self.slot() = None;
        self.clear_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
