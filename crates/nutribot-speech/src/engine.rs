//! Speech engine abstraction.
//!
//! An engine renders one utterance at a time. `speak` returns as soon as the
//! utterance has been queued; completion is reported later through the
//! [`UtteranceSignals`] handed over with it.

use serde::Serialize;

use crate::controller::UtteranceSignals;
use crate::error::PlaybackError;

/// A voice offered by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    /// Engine-specific voice name.
    pub name: String,
    /// BCP-47 style locale, e.g. `hi-IN`. Engines may report `hi_IN`.
    pub locale: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
        }
    }
}

/// A single request to speak text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    /// Locale requested for the utterance.
    pub locale: String,
    /// Chosen voice, or `None` for the engine default.
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    /// Create an utterance at normal rate and pitch.
    pub fn new(id: u64, text: impl Into<String>, locale: impl Into<String>, voice: Option<Voice>) -> Self {
        Self {
            id,
            text: text.into(),
            locale: locale.into(),
            voice,
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// Platform text-to-speech facility.
///
/// Implementations must tolerate `cancel_all` being called while nothing is
/// playing, and may invoke `signals` from any thread, including from inside
/// `speak` itself.
pub trait SpeechEngine: Send + Sync {
    /// Voices currently available. May be empty.
    fn voices(&self) -> Vec<Voice>;

    /// Begin speaking `utterance`.
    ///
    /// An `Err` means nothing was queued and no signal will follow.
    fn speak(&self, utterance: Utterance, signals: UtteranceSignals) -> Result<(), PlaybackError>;

    /// Stop anything queued or audible.
    fn cancel_all(&self);
}

/// Engine used when read-aloud is disabled. Every request fails.
#[derive(Debug, Clone, Default)]
pub struct NullSpeechEngine;

impl SpeechEngine for NullSpeechEngine {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, _utterance: Utterance, _signals: UtteranceSignals) -> Result<(), PlaybackError> {
        Err(PlaybackError::Unavailable("read-aloud is disabled".to_string()))
    }

    fn cancel_all(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_defaults() {
        let utterance = Utterance::new(3, "Eat oats", "en-US", None);
        assert_eq!(utterance.id, 3);
        assert_eq!(utterance.rate, 1.0);
        assert_eq!(utterance.pitch, 1.0);
        assert!(utterance.voice.is_none());
    }

    #[test]
    fn test_null_engine_has_no_voices() {
        assert!(NullSpeechEngine.voices().is_empty());
    }
}
