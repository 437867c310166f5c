//! Playback state with validated transitions.
//!
//! The controller moves between two states:
//! - Idle -> Speaking (utterance handed to the engine)
//! - Speaking -> Idle (stopped, finished, or failed)
//!
//! A Speaking state always names the utterance it belongs to so that late
//! engine signals can be matched against it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use nutribot_core::types::{LanguageCode, PlaybackStatus};

use crate::error::PlaybackError;

/// Snapshot of what the speech engine is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking {
        utterance_id: u64,
        text: String,
        language: LanguageCode,
        locale: String,
        started_at: DateTime<Utc>,
    },
}

impl PlaybackState {
    /// Coarse status exposed to the UI.
    pub fn status(&self) -> PlaybackStatus {
        match self {
            PlaybackState::Idle => PlaybackStatus::Idle,
            PlaybackState::Speaking { .. } => PlaybackStatus::Speaking,
        }
    }

    /// Id of the utterance currently audible, if any.
    pub fn active_utterance(&self) -> Option<u64> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Speaking { utterance_id, .. } => Some(*utterance_id),
        }
    }

    /// Whether a signal for `utterance_id` still refers to the active utterance.
    pub fn is_current(&self, utterance_id: u64) -> bool {
        self.active_utterance() == Some(utterance_id)
    }

    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &PlaybackState) -> bool {
        matches!(
            (self, target),
            (PlaybackState::Idle, PlaybackState::Speaking { .. })
                | (PlaybackState::Speaking { .. }, PlaybackState::Idle)
        )
    }

    /// Move to `target`, or leave the state untouched if the transition
    /// is not allowed.
    pub fn transition(&mut self, target: PlaybackState) -> Result<(), PlaybackError> {
        if !self.can_transition_to(&target) {
            return Err(PlaybackError::InvalidTransition {
                from: self.status(),
                to: target.status(),
            });
        }
        tracing::debug!("Playback state: {} -> {}", self.status(), target.status());
        *self = target;
        Ok(())
    }
}
