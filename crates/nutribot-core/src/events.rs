use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::types::{LanguageCode, TurnId};

/// Why a turn ended with a substitute message instead of an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The input could not be translated to the canonical language.
    TranslationUnavailable,
    /// The answering service could not be reached or sent garbage.
    QueryTransport,
    /// The answering service replied with `success: false`.
    QueryRejected,
}

/// All domain events that can occur in a chat session.
///
/// Events are published on the session's [`EventBus`] after the state change
/// they describe has been applied. Consumers are diagnostics and telemetry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainEvent {
    // =========================================================================
    // Turn pipeline
    // =========================================================================
    /// A user turn was accepted and the pipeline started.
    TurnSubmitted {
        session_id: Uuid,
        turn_id: TurnId,
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// An assistant answer was appended to the transcript.
    AnswerDelivered {
        session_id: Uuid,
        turn_id: TurnId,
        language: LanguageCode,
        source_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A substitute assistant turn was appended.
    FallbackDelivered {
        session_id: Uuid,
        turn_id: TurnId,
        reason: FallbackReason,
        timestamp: DateTime<Utc>,
    },

    /// The answer could not be translated back and is shown in the canonical language.
    BackTranslationSkipped {
        session_id: Uuid,
        target: LanguageCode,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline finished after a reset and its result was dropped.
    StaleResultDiscarded {
        session_id: Uuid,
        started_generation: u64,
        current_generation: u64,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Session
    // =========================================================================
    /// The transcript was cleared.
    SessionReset {
        session_id: Uuid,
        generation: u64,
        discarded_turns: usize,
        timestamp: DateTime<Utc>,
    },

    /// The answering service could not be told to forget its history.
    ResetNotificationFailed {
        session_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Playback
    // =========================================================================
    PlaybackStarted {
        utterance_id: u64,
        locale: String,
        voice: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Playback was stopped by the user or a reset.
    PlaybackStopped {
        utterance_id: Option<u64>,
        timestamp: DateTime<Utc>,
    },

    /// The utterance played to the end.
    PlaybackFinished {
        utterance_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// The speech engine reported an error.
    PlaybackFailed {
        utterance_id: Option<u64>,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Short machine-readable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::TurnSubmitted { .. } => "turn_submitted",
            DomainEvent::AnswerDelivered { .. } => "answer_delivered",
            DomainEvent::FallbackDelivered { .. } => "fallback_delivered",
            DomainEvent::BackTranslationSkipped { .. } => "back_translation_skipped",
            DomainEvent::StaleResultDiscarded { .. } => "stale_result_discarded",
            DomainEvent::SessionReset { .. } => "session_reset",
            DomainEvent::ResetNotificationFailed { .. } => "reset_notification_failed",
            DomainEvent::PlaybackStarted { .. } => "playback_started",
            DomainEvent::PlaybackStopped { .. } => "playback_stopped",
            DomainEvent::PlaybackFinished { .. } => "playback_finished",
            DomainEvent::PlaybackFailed { .. } => "playback_failed",
        }
    }
}

/// Broadcast channel for [`DomainEvent`]s.
///
/// Publishing never fails: with no subscribers the event is dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: DomainEvent) {
        tracing::trace!(kind = event.kind(), "Domain event");
        // No receivers is not an error for the publisher.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
