//! Sound sources for the start and alert cues.
//!
//! A cue is either a synthesized tone or a user-supplied audio file. Files
//! are checked up front so a bad path is reported when the daemon starts,
//! not the first time an event begins.

use std::path::{Path, PathBuf};

use super::error::SoundError;

/// File extensions rodio can decode with its default features.
const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

/// Which cue to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// An event started or resumed.
    Start,
    /// An event is about to complete.
    Alert,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Start => "start",
            Cue::Alert => "alert",
        }
    }
}

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// A sine tone generated on the fly.
    Tone {
        /// Pitch in hertz.
        frequency_hz: u32,
        /// Length in milliseconds.
        millis: u64,
    },
    /// An audio file on disk.
    File {
        /// The full path to the sound file.
        path: PathBuf,
    },
}

impl SoundSource {
    /// Creates a tone source.
    #[must_use]
    pub fn tone(frequency_hz: u32, millis: u64) -> Self {
        Self::Tone {
            frequency_hz,
            millis,
        }
    }

    /// Creates a file source without checking the path.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Creates a file source after checking the file exists and has a
    /// supported extension.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` or `UnsupportedFormat`.
    pub fn file_validated(path: impl Into<PathBuf>) -> Result<Self, SoundError> {
        let path = path.into();
        validate_sound_file(&path)?;
        Ok(Self::File { path })
    }

    /// Short description for logs.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Tone {
                frequency_hz,
                millis,
            } => format!("{} Hz tone ({} ms)", frequency_hz, millis),
            Self::File { path } => path.display().to_string(),
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Returns the file path if this is a file source.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path } => Some(path),
            Self::Tone { .. } => None,
        }
    }
}

fn validate_sound_file(path: &Path) -> Result<(), SoundError> {
    if !path.is_file() {
        return Err(SoundError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(SoundError::UnsupportedFormat(path.display().to_string()))
    }
}

/// The sound for each cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueSounds {
    pub start: SoundSource,
    pub alert: SoundSource,
}

impl Default for CueSounds {
    fn default() -> Self {
        Self {
            start: default_sound(Cue::Start),
            alert: default_sound(Cue::Alert),
        }
    }
}

impl CueSounds {
    /// Uses the given files where present and the built-in tones elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file is missing or unsupported.
    pub fn from_paths(start: Option<&Path>, alert: Option<&Path>) -> Result<Self, SoundError> {
        let mut sounds = Self::default();
        if let Some(path) = start {
            sounds.start = SoundSource::file_validated(path)?;
        }
        if let Some(path) = alert {
            sounds.alert = SoundSource::file_validated(path)?;
        }
        Ok(sounds)
    }

    #[must_use]
    pub fn get(&self, cue: Cue) -> &SoundSource {
        match cue {
            Cue::Start => &self.start,
            Cue::Alert => &self.alert,
        }
    }
}

/// Built-in tone for a cue: a short high blip to start, a longer lower
/// tone for the alert.
#[must_use]
pub fn default_sound(cue: Cue) -> SoundSource {
    match cue {
        Cue::Start => SoundSource::tone(880, 150),
        Cue::Alert => SoundSource::tone(660, 800),
    }
}
