//! Cue playback using rodio.
//!
//! rodio's `OutputStream` cannot cross threads, so the stream lives on a
//! dedicated audio thread that receives commands over a crossbeam channel.
//! The thread keeps every sink it starts so a stop-all can cut them off.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::{default_sound, Cue, CueSounds, SoundSource};
use super::Notifier;

/// Volume applied to generated tones.
const TONE_AMPLITUDE: f32 = 0.2;

/// Commands accepted by the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCommand {
    Play(Cue),
    StopAll,
    Shutdown,
}

/// Handle to the audio thread.
///
/// Dropping the handle shuts the thread down.
pub struct AudioWorker {
    tx: Sender<AudioCommand>,
    handle: Option<JoinHandle<()>>,
}

impl AudioWorker {
    /// Starts the audio thread and opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotAvailable` if no output device can be opened.
    pub fn spawn(sounds: CueSounds) -> Result<Self, SoundError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let handle = thread::Builder::new()
            .name("steptimer-audio".to_string())
            .spawn(move || {
                let (_stream, stream_handle) = match OutputStream::try_default() {
                    Ok(output) => {
                        let _ = ready_tx.send(Ok(()));
                        output
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
                        return;
                    }
                };
                debug!("Audio output stream initialized");
                run_audio_loop(&stream_handle, &sounds, &rx);
                debug!("Audio thread stopped");
            })
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx,
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(SoundError::WorkerGone)
            }
        }
    }

    /// Queues a command for the audio thread.
    ///
    /// # Errors
    ///
    /// Returns `WorkerGone` if the thread has exited.
    pub fn send(&self, command: AudioCommand) -> Result<(), SoundError> {
        self.tx.send(command).map_err(|_| SoundError::WorkerGone)
    }
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for AudioWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioWorker")
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

fn run_audio_loop(stream: &OutputStreamHandle, sounds: &CueSounds, rx: &Receiver<AudioCommand>) {
    let mut sinks: Vec<Sink> = Vec::new();

    for command in rx.iter() {
        sinks.retain(|sink| !sink.empty());

        match command {
            AudioCommand::Play(cue) => match play_cue(stream, sounds, cue) {
                Ok(sink) => sinks.push(sink),
                Err(e) => warn!("Failed to play {} cue: {}", cue.as_str(), e),
            },
            AudioCommand::StopAll => {
                debug!("Stopping {} sound(s)", sinks.len());
                for sink in sinks.drain(..) {
                    sink.stop();
                }
            }
            AudioCommand::Shutdown => break,
        }
    }

    for sink in sinks {
        sink.stop();
    }
}

fn play_cue(stream: &OutputStreamHandle, sounds: &CueSounds, cue: Cue) -> Result<Sink, SoundError> {
    let source = sounds.get(cue);
    match play_source(stream, source) {
        Err(e) if e.should_fallback_to_tone() => {
            warn!(
                "Failed to play '{}': {}, falling back to built-in tone",
                source.name(),
                e
            );
            play_source(stream, &default_sound(cue))
        }
        result => result,
    }
}

fn play_source(stream: &OutputStreamHandle, source: &SoundSource) -> Result<Sink, SoundError> {
    let sink = Sink::try_new(stream).map_err(|e| SoundError::StreamError(e.to_string()))?;

    match source {
        SoundSource::Tone {
            frequency_hz,
            millis,
        } => {
            let tone = SineWave::new(*frequency_hz as f32)
                .take_duration(Duration::from_millis(*millis))
                .amplify(TONE_AMPLITUDE);
            sink.append(tone);
        }
        SoundSource::File { path } => sink.append(open_decoder(path)?),
    }

    debug!("Playing {}", source.name());
    Ok(sink)
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, SoundError> {
    let file = File::open(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Decoder::new(BufReader::new(file)).map_err(|e| SoundError::DecodeError(e.to_string()))
}

/// Notifier that plays cues through the audio thread.
#[derive(Debug)]
pub struct AudioNotifier {
    worker: AudioWorker,
}

impl AudioNotifier {
    /// # Errors
    ///
    /// Returns an error if the audio thread cannot open an output device.
    pub fn new(sounds: CueSounds) -> Result<Self, SoundError> {
        Ok(Self {
            worker: AudioWorker::spawn(sounds)?,
        })
    }

    fn send(&self, command: AudioCommand) {
        if let Err(e) = self.worker.send(command) {
            warn!("Audio command {:?} dropped: {}", command, e);
        }
    }
}

impl Notifier for AudioNotifier {
    fn on_start(&self) {
        self.send(AudioCommand::Play(Cue::Start));
    }

    fn on_alert(&self) {
        self.send(AudioCommand::Play(Cue::Alert));
    }

    fn on_stop_all(&self) {
        self.send(AudioCommand::StopAll);
    }
}

/// Creates an audio notifier, returning None if audio is unavailable.
///
/// If audio initialization fails, a warning is logged and None is returned.
#[must_use]
pub fn try_create_notifier(sounds: CueSounds) -> Option<AudioNotifier> {
    match AudioNotifier::new(sounds) {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            warn!("Audio not available, sound disabled: {} ({})", e, e.suggestion());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_create_notifier_no_panic() {
        // Containers usually have no audio device; either outcome is fine.
        if let Some(notifier) = try_create_notifier(CueSounds::default()) {
            notifier.on_start();
            notifier.on_alert();
            notifier.on_stop_all();
        }
    }

    #[test]
    fn test_open_decoder_missing_file() {
        let err = open_decoder(Path::new("/nonexistent/cue.wav")).err().unwrap();
        assert!(err.is_file_error());
        assert!(err.should_fallback_to_tone());
    }

    #[test]
    fn test_audio_command_is_copy() {
        let command = AudioCommand::Play(Cue::Alert);
        let copy = command;
        assert_eq!(command, copy);
        assert_ne!(AudioCommand::StopAll, AudioCommand::Shutdown);
    }
}
