//! Read-aloud playback controller.
//!
//! Owns the speech engine and the playback state. `toggle` and `stop` are
//! serialized against each other; engine signals only touch the state and
//! may arrive from any thread, including synchronously from inside `speak`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use nutribot_core::events::{DomainEvent, EventBus};
use nutribot_core::types::{LanguageCode, PlaybackStatus};

use crate::engine::{SpeechEngine, Utterance};
use crate::state::PlaybackState;
use crate::voice::{locale_for, resolve_voice};

struct Shared {
    state: Mutex<PlaybackState>,
    /// Held for the whole of `toggle`/`stop`, never by signals.
    serial: Mutex<()>,
    next_id: AtomicU64,
    events: EventBus,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Completion callbacks for one utterance.
///
/// Signals for an utterance that is no longer the active one are ignored,
/// so a cancelled utterance cannot flip a newer one back to Idle.
#[derive(Clone)]
pub struct UtteranceSignals {
    utterance_id: u64,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for UtteranceSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtteranceSignals")
            .field("utterance_id", &self.utterance_id)
            .finish()
    }
}

impl UtteranceSignals {
    pub fn utterance_id(&self) -> u64 {
        self.utterance_id
    }

    /// The utterance played to the end.
    pub fn finished(&self) {
        if self.settle() {
            tracing::debug!(utterance_id = self.utterance_id, "Playback finished");
            self.shared.events.publish(DomainEvent::PlaybackFinished {
                utterance_id: self.utterance_id,
                timestamp: Utc::now(),
            });
        }
    }

    /// The engine gave up on the utterance.
    pub fn failed(&self, error: impl Into<String>) {
        let error = error.into();
        if self.settle() {
            tracing::warn!(utterance_id = self.utterance_id, error = %error, "Playback failed");
            self.shared.events.publish(DomainEvent::PlaybackFailed {
                utterance_id: Some(self.utterance_id),
                error,
                timestamp: Utc::now(),
            });
        }
    }

    /// Move to Idle if this utterance is still the active one.
    fn settle(&self) -> bool {
        let mut state = self.shared.state();
        if !state.is_current(self.utterance_id) {
            tracing::trace!(
                utterance_id = self.utterance_id,
                "Ignoring signal for superseded utterance"
            );
            return false;
        }
        state.transition(PlaybackState::Idle).is_ok()
    }
}

/// Single point of control over speech output.
///
/// Cloning yields another handle to the same engine and state.
#[derive(Clone)]
pub struct PlaybackController {
    engine: Arc<dyn SpeechEngine>,
    shared: Arc<Shared>,
    quality_markers: Arc<[String]>,
}

impl PlaybackController {
    pub fn new(engine: Arc<dyn SpeechEngine>, quality_markers: Vec<String>, events: EventBus) -> Self {
        Self {
            engine,
            shared: Arc::new(Shared {
                state: Mutex::new(PlaybackState::Idle),
                serial: Mutex::new(()),
                next_id: AtomicU64::new(1),
                events,
            }),
            quality_markers: quality_markers.into(),
        }
    }

    /// Current coarse status.
    pub fn status(&self) -> PlaybackStatus {
        self.shared.state().status()
    }

    /// Full snapshot of the playback state.
    pub fn state(&self) -> PlaybackState {
        self.shared.state().clone()
    }

    /// Start speaking `text`, or stop if something is already speaking.
    ///
    /// Returns the status after the call. Engine failures are logged and
    /// published, never returned; the controller simply stays Idle.
    pub fn toggle(&self, text: &str, language: &LanguageCode) -> PlaybackStatus {
        let _serial = self.shared.serial.lock().unwrap_or_else(PoisonError::into_inner);

        if self.status() == PlaybackStatus::Speaking {
            self.interrupt();
            return PlaybackStatus::Idle;
        }

        // Clear anything the engine still has queued from a superseded utterance.
        self.engine.cancel_all();

        if text.trim().is_empty() {
            return PlaybackStatus::Idle;
        }

        let locale = locale_for(language);
        let voices = self.engine.voices();
        let voice = resolve_voice(&voices, language, &self.quality_markers).cloned();
        let utterance_id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);

        let speaking = PlaybackState::Speaking {
            utterance_id,
            text: text.to_string(),
            language: language.clone(),
            locale: locale.to_string(),
            started_at: Utc::now(),
        };
        let started = self.shared.state().transition(speaking);
        if let Err(e) = started {
            tracing::warn!(utterance_id, error = %e, "Playback not started");
            return self.status();
        }

        tracing::info!(
            utterance_id,
            locale,
            voice = voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            "Playback started"
        );
        self.shared.events.publish(DomainEvent::PlaybackStarted {
            utterance_id,
            locale: locale.to_string(),
            voice: voice.as_ref().map(|v| v.name.clone()),
            timestamp: Utc::now(),
        });

        let utterance = Utterance::new(utterance_id, text, locale, voice);
        let signals = UtteranceSignals {
            utterance_id,
            shared: Arc::clone(&self.shared),
        };

        match self.engine.speak(utterance, signals) {
            Ok(()) => self.status(),
            Err(e) => {
                tracing::warn!(utterance_id, error = %e, "Speech engine refused utterance");
                {
                    let mut state = self.shared.state();
                    if state.is_current(utterance_id) {
                        let _ = state.transition(PlaybackState::Idle);
                    }
                }
                self.shared.events.publish(DomainEvent::PlaybackFailed {
                    utterance_id: Some(utterance_id),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                PlaybackStatus::Idle
            }
        }
    }

    /// Force playback to Idle and cancel the engine. Safe to call when idle.
    pub fn stop(&self) {
        let _serial = self.shared.serial.lock().unwrap_or_else(PoisonError::into_inner);
        self.interrupt();
    }

    fn interrupt(&self) {
        let stopped = {
            let mut state = self.shared.state();
            let active = state.active_utterance();
            if active.is_some() {
                let _ = state.transition(PlaybackState::Idle);
            }
            active
        };
        self.engine.cancel_all();

        if let Some(utterance_id) = stopped {
            tracing::info!(utterance_id, "Playback stopped");
            self.shared.events.publish(DomainEvent::PlaybackStopped {
                utterance_id: Some(utterance_id),
                timestamp: Utc::now(),
            });
        }
    }
}
