//! JSON file repository.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::Activity;

use super::error::PersistenceError;
use super::ActivityRepository;

/// Stores activities as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ActivityRepository for JsonFileRepository {
    fn load(&self) -> Result<Vec<Activity>, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No saved activities at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(PersistenceError::ReadError(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            PersistenceError::CorruptData(format!("{}: {}", self.path.display(), e))
        })
    }

    fn save(&self, activities: &[Activity]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::WriteError(format!("{}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(activities)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;

        // Write then rename so a crash never leaves a half-written file.
        let temp = self.temp_path();
        fs::write(&temp, json)
            .map_err(|e| PersistenceError::WriteError(format!("{}: {}", temp.display(), e)))?;
        fs::rename(&temp, &self.path).map_err(|e| {
            PersistenceError::WriteError(format!("{}: {}", self.path.display(), e))
        })
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::WriteError(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_repository() -> (tempfile::TempDir, JsonFileRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path().join("nested").join("activities.json"));
        (dir, repository)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, repository) = temp_repository();
        assert!(repository.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_and_loads_back() {
        let (_dir, repository) = temp_repository();
        let activities = vec![Activity::builtin_default(), Activity::new_default()];

        repository.save(&activities).unwrap();
        assert!(repository.path().exists());
        assert!(!repository.temp_path().exists());

        let loaded = repository.load().unwrap();
        assert_eq!(loaded, activities);
    }

    #[test]
    fn test_load_corrupt_file() {
        let (_dir, repository) = temp_repository();
        fs::create_dir_all(repository.path().parent().unwrap()).unwrap();
        fs::write(repository.path(), "{not json").unwrap();

        let err = repository.load().unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_clear_removes_file_and_tolerates_missing() {
        let (_dir, repository) = temp_repository();
        repository.save(&[Activity::new_default()]).unwrap();

        repository.clear().unwrap();
        assert!(!repository.path().exists());
        repository.clear().unwrap();
    }
}
