//! Chat session: transcript, input buffer, and in-flight bookkeeping.
//!
//! The turn pipeline lives in `orchestrator.rs` and reset in `reset.rs`;
//! both are `impl ChatSession` blocks over the state defined here.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use nutribot_core::events::EventBus;
use nutribot_core::types::{LanguageCode, PlaybackStatus, PreferredLanguage, Turn, TurnId};
use nutribot_search::AnswerClient;
use nutribot_speech::PlaybackController;
use nutribot_translate::TranslationClient;

use crate::error::ChatError;

/// Mutable session state. Only touched with the session lock held, and the
/// lock is never held across an await.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) turns: Vec<Turn>,
    pub(crate) pending_input: String,
    pub(crate) is_processing: bool,
    pub(crate) preferred_language: PreferredLanguage,
    /// Bumped by every reset; pipelines compare it before writing results.
    pub(crate) generation: u64,
    next_turn_id: u64,
}

impl SessionState {
    /// Append a turn built from a freshly allocated id.
    pub(crate) fn push_turn(&mut self, build: impl FnOnce(TurnId) -> Turn) -> TurnId {
        self.next_turn_id += 1;
        let id = TurnId(self.next_turn_id);
        self.turns.push(build(id));
        id
    }
}

/// One conversation with the assistant.
pub struct ChatSession {
    pub(crate) id: Uuid,
    pub(crate) state: Mutex<SessionState>,
    pub(crate) translator: Arc<dyn TranslationClient>,
    pub(crate) answers: Arc<dyn AnswerClient>,
    pub(crate) playback: PlaybackController,
    pub(crate) events: EventBus,
    pub(crate) canonical: LanguageCode,
}

impl ChatSession {
    pub fn new(
        translator: Arc<dyn TranslationClient>,
        answers: Arc<dyn AnswerClient>,
        playback: PlaybackController,
        events: EventBus,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "Chat session created");
        Self {
            id,
            state: Mutex::new(SessionState::default()),
            translator,
            answers,
            playback,
            events,
            canonical: LanguageCode::canonical(),
        }
    }

    pub fn with_preferred_language(self, preferred: PreferredLanguage) -> Self {
        self.set_preferred_language(preferred);
        self
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn canonical_language(&self) -> &LanguageCode {
        &self.canonical
    }

    // =========================================================================
    // Transcript
    // =========================================================================

    /// Snapshot of the transcript in order.
    pub fn turns(&self) -> Vec<Turn> {
        self.lock().turns.clone()
    }

    pub fn turn(&self, id: TurnId) -> Option<Turn> {
        self.lock().turns.iter().find(|t| t.id == id).cloned()
    }

    pub fn latest_assistant_turn(&self) -> Option<Turn> {
        self.lock()
            .turns
            .iter()
            .rev()
            .find(|t| t.is_assistant())
            .cloned()
    }

    pub fn is_processing(&self) -> bool {
        self.lock().is_processing
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    // =========================================================================
    // Input and preferences
    // =========================================================================

    pub fn pending_input(&self) -> String {
        self.lock().pending_input.clone()
    }

    /// Replace the unsent input buffer.
    pub fn set_pending_input(&self, text: impl Into<String>) {
        self.lock().pending_input = text.into();
    }

    pub fn preferred_language(&self) -> PreferredLanguage {
        self.lock().preferred_language.clone()
    }

    /// Takes effect from the next submitted turn.
    pub fn set_preferred_language(&self, preferred: PreferredLanguage) {
        tracing::info!(session_id = %self.id, preferred = %preferred, "Preferred language changed");
        self.lock().preferred_language = preferred;
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub fn playback_status(&self) -> PlaybackStatus {
        self.playback.status()
    }

    /// Silence any read-aloud in progress.
    pub fn stop_playback(&self) {
        self.playback.stop();
    }

    /// Read an assistant turn aloud, or stop whatever is currently speaking.
    pub fn toggle_playback(&self, turn_id: TurnId) -> Result<PlaybackStatus, ChatError> {
        let turn = self.turn(turn_id).ok_or(ChatError::TurnNotFound(turn_id))?;
        if !turn.is_assistant() {
            return Err(ChatError::NotAssistantTurn(turn_id));
        }
        Ok(self
            .playback
            .toggle(&turn.content, &turn.effective_language()))
    }
}

/// Clears `is_processing` when a pipeline ends, including when its future
/// is dropped mid-flight.
///
/// A guard from an older generation leaves the flag alone: after a reset
/// the flag belongs to the new generation.
pub(crate) struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
}

impl<'a> InFlightGuard<'a> {
    pub(crate) fn new(state: &'a Mutex<SessionState>, generation: u64) -> Self {
        Self { state, generation }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation {
            state.is_processing = false;
        }
    }
}
