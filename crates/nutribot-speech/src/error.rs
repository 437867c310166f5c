//! Error types for speech playback.

use nutribot_core::types::PlaybackStatus;

/// Errors from a speech engine or the playback state.
///
/// These never reach the caller of `toggle`; the controller logs them,
/// publishes a failure event, and returns to Idle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("invalid playback transition: {from} -> {to}")]
    InvalidTransition { from: PlaybackStatus, to: PlaybackStatus },
}
