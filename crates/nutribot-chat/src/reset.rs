//! Session reset ("new chat").

use std::sync::Arc;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use nutribot_core::events::DomainEvent;

use crate::session::ChatSession;

impl ChatSession {
    /// Start a fresh conversation.
    ///
    /// Clears the transcript and input, stops playback, and releases the
    /// in-flight flag, all before returning. A turn still in flight finishes
    /// in the background and its result is discarded.
    ///
    /// The answering service is told to forget its history on a detached
    /// task. Its failure is logged and published but never affects the reset.
    /// Returns the task handle, or `None` when called outside a runtime.
    pub fn reset(&self) -> Option<JoinHandle<()>> {
        let (generation, discarded_turns) = {
            let mut state = self.lock();
            state.generation += 1;
            let discarded = state.turns.len();
            state.turns.clear();
            state.pending_input.clear();
            state.is_processing = false;
            (state.generation, discarded)
        };

        self.playback.stop();

        tracing::info!(
            session_id = %self.id,
            generation,
            discarded_turns,
            "Session reset"
        );
        self.events.publish(DomainEvent::SessionReset {
            session_id: self.id,
            generation,
            discarded_turns,
            timestamp: Utc::now(),
        });

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(session_id = %self.id, "No runtime, skipping reset notification");
                return None;
            }
        };

        let answers = Arc::clone(&self.answers);
        let events = self.events.clone();
        let session_id = self.id;
        Some(runtime.spawn(async move {
            match answers.notify_reset().await {
                Ok(()) => tracing::debug!(session_id = %session_id, "Answering service history cleared"),
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to clear answering service history"
                    );
                    events.publish(DomainEvent::ResetNotificationFailed {
                        session_id,
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }))
    }
}
