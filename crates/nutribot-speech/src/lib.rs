//! NutriBot speech crate - read-aloud playback for assistant turns.
//!
//! A single [`PlaybackController`] owns the speech engine. At most one
//! utterance is audible at a time, and toggling the same control twice
//! always lands back on Idle. Engines report completion through
//! [`UtteranceSignals`], which are ignored once their utterance has been
//! superseded.

pub mod controller;
pub mod engine;
pub mod error;
pub mod state;
pub mod voice;

pub use controller::{PlaybackController, UtteranceSignals};
pub use engine::{NullSpeechEngine, SpeechEngine, Utterance, Voice};
pub use error::PlaybackError;
pub use state::PlaybackState;
pub use voice::{locale_for, resolve_voice};
