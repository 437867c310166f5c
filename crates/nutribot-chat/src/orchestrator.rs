//! Turn pipeline: one user message in, one assistant turn out.
//!
//! Steps run strictly in order:
//! 1. append the user turn verbatim
//! 2. translate the input into the canonical language
//! 3. resolve the output language
//! 4. query the answering service, translating the answer back if needed
//! 5. append the assistant turn (an answer or a fallback)
//!
//! Only one pipeline runs at a time. A reset while a pipeline is suspended
//! bumps the session generation and the late result is dropped.

use chrono::Utc;

use nutribot_core::events::{DomainEvent, FallbackReason};
use nutribot_core::types::{Citation, LanguageCode, PreferredLanguage, Turn, TurnId};

use crate::error::ChatError;
use crate::negotiation::LanguageNegotiation;
use crate::session::{ChatSession, InFlightGuard};

/// Shown when the user's message could not be translated.
pub const TRANSLATION_FALLBACK: &str = "Sorry, I couldn't translate your message. Please try again.";
/// Shown when the answering service could not be reached.
pub const CONNECTION_FALLBACK: &str = "Error: Could not connect to the backend. Please try again later.";
/// Shown when the answering service was reached but did not answer.
pub const REJECTED_FALLBACK: &str = "I'm having trouble connecting to the database. Please try again.";

/// Fixed user-facing text for a failed turn.
pub fn fallback_message(reason: FallbackReason) -> &'static str {
    match reason {
        FallbackReason::TranslationUnavailable => TRANSLATION_FALLBACK,
        FallbackReason::QueryTransport => CONNECTION_FALLBACK,
        FallbackReason::QueryRejected => REJECTED_FALLBACK,
    }
}

/// Why a submission was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Input was empty or whitespace only.
    Empty,
    /// Another turn is still in flight.
    Busy,
}

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was appended.
    Rejected(RejectReason),
    /// An answer was appended as `turn_id`.
    Answered { turn_id: TurnId },
    /// A fallback message was appended as `turn_id`.
    Fallback { turn_id: TurnId, reason: FallbackReason },
    /// The session was reset while the turn was in flight; the result was dropped.
    Discarded,
}

/// Everything needed to append a successful assistant turn.
struct Reply {
    text: String,
    sources: Vec<Citation>,
    language: LanguageCode,
}

impl ChatSession {
    /// Run one user message through the pipeline.
    ///
    /// Never fails: translation and query errors become a fallback turn.
    pub async fn submit(&self, raw_text: &str) -> SubmitOutcome {
        if raw_text.trim().is_empty() {
            return SubmitOutcome::Rejected(RejectReason::Empty);
        }

        let (generation, user_turn, preferred) = {
            let mut state = self.lock();
            if state.is_processing {
                tracing::debug!(session_id = %self.id, "Submission rejected: turn in flight");
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }
            state.is_processing = true;
            let user_turn = state.push_turn(|id| Turn::user(id, raw_text));
            (state.generation, user_turn, state.preferred_language.clone())
        };
        let _in_flight = InFlightGuard::new(&self.state, generation);

        tracing::info!(
            session_id = %self.id,
            generation,
            turn_id = %user_turn,
            "Turn submitted"
        );
        self.events.publish(DomainEvent::TurnSubmitted {
            session_id: self.id,
            turn_id: user_turn,
            generation,
            timestamp: Utc::now(),
        });

        let result = self.run_pipeline(raw_text.trim(), &preferred).await;

        let mut state = self.lock();
        if state.generation != generation {
            tracing::info!(
                session_id = %self.id,
                started_generation = generation,
                current_generation = state.generation,
                "Discarding result from before reset"
            );
            self.events.publish(DomainEvent::StaleResultDiscarded {
                session_id: self.id,
                started_generation: generation,
                current_generation: state.generation,
                timestamp: Utc::now(),
            });
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(reply) => {
                let source_count = reply.sources.len();
                let language = reply.language.clone();
                let turn_id = state.push_turn(|id| {
                    Turn::assistant(id, reply.text, reply.sources, Some(reply.language))
                });
                tracing::info!(
                    session_id = %self.id,
                    turn_id = %turn_id,
                    language = %language,
                    source_count,
                    "Answer delivered"
                );
                self.events.publish(DomainEvent::AnswerDelivered {
                    session_id: self.id,
                    turn_id,
                    language,
                    source_count,
                    timestamp: Utc::now(),
                });
                SubmitOutcome::Answered { turn_id }
            }
            Err(e) => {
                let reason = e
                    .fallback_reason()
                    .unwrap_or(FallbackReason::QueryTransport);
                let turn_id = state.push_turn(|id| {
                    Turn::assistant(id, fallback_message(reason), Vec::new(), None)
                });
                tracing::warn!(
                    session_id = %self.id,
                    turn_id = %turn_id,
                    ?reason,
                    error = %e,
                    "Turn failed, fallback delivered"
                );
                self.events.publish(DomainEvent::FallbackDelivered {
                    session_id: self.id,
                    turn_id,
                    reason,
                    timestamp: Utc::now(),
                });
                SubmitOutcome::Fallback { turn_id, reason }
            }
        }
    }

    /// Submit the pending input buffer, clearing it once accepted.
    ///
    /// The buffer is kept when the submission is rejected as busy.
    pub async fn submit_pending(&self) -> SubmitOutcome {
        let text = {
            let mut state = self.lock();
            if state.is_processing {
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }
            if state.pending_input.trim().is_empty() {
                return SubmitOutcome::Rejected(RejectReason::Empty);
            }
            std::mem::take(&mut state.pending_input)
        };
        self.submit(&text).await
    }

    /// Steps 2 to 4. Holds no lock.
    async fn run_pipeline(
        &self,
        text: &str,
        preferred: &PreferredLanguage,
    ) -> Result<Reply, ChatError> {
        // The preference picks the reply language only; the input is always auto-detected.
        let translation = self.translator.translate(text, &self.canonical, None).await?;
        let negotiation = LanguageNegotiation::negotiate(translation, preferred);
        tracing::debug!(
            session_id = %self.id,
            detected = %negotiation.detected_source_language,
            resolved = %negotiation.resolved_output_language,
            "Language negotiated"
        );

        let answer = self.answers.query(&negotiation.canonical_text).await?;

        if !negotiation.needs_back_translation(&self.canonical) {
            return Ok(Reply {
                text: answer.text,
                sources: answer.sources,
                language: self.canonical.clone(),
            });
        }

        let target = negotiation.resolved_output_language;
        match self
            .translator
            .translate(&answer.text, &target, Some(&self.canonical))
            .await
        {
            Ok(back) => Ok(Reply {
                text: back.text,
                sources: answer.sources,
                language: target,
            }),
            Err(e) => {
                // An untranslated answer beats no answer.
                tracing::warn!(
                    session_id = %self.id,
                    target = %target,
                    error = %e,
                    "Back-translation failed, showing canonical answer"
                );
                self.events.publish(DomainEvent::BackTranslationSkipped {
                    session_id: self.id,
                    target,
                    timestamp: Utc::now(),
                });
                Ok(Reply {
                    text: answer.text,
                    sources: answer.sources,
                    language: self.canonical.clone(),
                })
            }
        }
    }
}
