//! Speech engine that shells out to an `espeak-ng` compatible synthesizer.
//!
//! One child process per utterance. A watcher thread polls the child and
//! reports completion; `cancel_all` kills it.

use std::io::ErrorKind;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use nutribot_speech::{PlaybackError, SpeechEngine, Utterance, UtteranceSignals, Voice};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Playing {
    utterance_id: u64,
    child: Child,
}

pub struct CommandSpeechEngine {
    command: String,
    voices: Vec<Voice>,
    playing: Arc<Mutex<Option<Playing>>>,
}

impl CommandSpeechEngine {
    /// Create an engine for `command`, probing its voice list once.
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        let voices = probe_voices(&command);
        tracing::info!(command = %command, voices = voices.len(), "Speech backend ready");
        Self {
            command,
            voices,
            playing: Arc::new(Mutex::new(None)),
        }
    }

    fn playing(&self) -> MutexGuard<'_, Option<Playing>> {
        self.playing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance, signals: UtteranceSignals) -> Result<(), PlaybackError> {
        let child = Command::new(&self.command)
            .arg("-v")
            .arg(voice_arg(&utterance))
            .arg("--")
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    PlaybackError::Unavailable(format!("{} not found", self.command))
                } else {
                    PlaybackError::Synthesis(format!("failed to run {}: {}", self.command, e))
                }
            })?;

        let utterance_id = utterance.id;
        if let Some(mut previous) = self.playing().replace(Playing { utterance_id, child }) {
            let _ = previous.child.kill();
            let _ = previous.child.wait();
        }

        let playing = Arc::clone(&self.playing);
        let spawned = std::thread::Builder::new()
            .name("speech-watch".to_string())
            .spawn(move || watch(playing, utterance_id, signals));
        if let Err(e) = spawned {
            self.cancel_all();
            return Err(PlaybackError::Synthesis(format!("failed to watch synthesizer: {}", e)));
        }
        Ok(())
    }

    fn cancel_all(&self) {
        if let Some(mut playing) = self.playing().take() {
            tracing::debug!(utterance_id = playing.utterance_id, "Killing synthesizer");
            let _ = playing.child.kill();
            let _ = playing.child.wait();
        }
    }
}

/// Poll the child for `utterance_id` until it exits or is replaced.
fn watch(playing: Arc<Mutex<Option<Playing>>>, utterance_id: u64, signals: UtteranceSignals) {
    loop {
        let outcome = {
            let mut guard = playing.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(current) = guard.as_mut().filter(|p| p.utterance_id == utterance_id) else {
                // Cancelled or superseded; whoever replaced it already reaped the child.
                return;
            };
            match current.child.try_wait() {
                Ok(Some(status)) => {
                    *guard = None;
                    Some(if status.success() {
                        Ok(())
                    } else {
                        Err(format!("synthesizer exited with {}", status))
                    })
                }
                Ok(None) => None,
                Err(e) => {
                    *guard = None;
                    Some(Err(e.to_string()))
                }
            }
        };

        match outcome {
            Some(Ok(())) => {
                signals.finished();
                return;
            }
            Some(Err(e)) => {
                signals.failed(e);
                return;
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    }
}

/// Voice identifier passed with `-v`: the chosen voice's language, or the
/// primary subtag of the requested locale.
fn voice_arg(utterance: &Utterance) -> String {
    match &utterance.voice {
        Some(voice) => voice.locale.clone(),
        None => utterance
            .locale
            .split(['-', '_'])
            .next()
            .unwrap_or("en")
            .to_ascii_lowercase(),
    }
}

fn probe_voices(command: &str) -> Vec<Voice> {
    match Command::new(command).arg("--voices").output() {
        Ok(output) if output.status.success() => {
            parse_voices(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            tracing::debug!(command, status = %output.status, "Voice listing failed");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(command, error = %e, "Speech synthesizer not available");
            Vec::new()
        }
    }
}

/// Parse `espeak-ng --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US     (en 10)
/// ```
fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            match cols.as_slice() {
                [_, language, _, name, ..] => Some(Voice::new(name.replace('_', " "), *language)),
                _ => None,
            }
        })
        .collect()
}
