//! NutriBot chat crate - the multilingual turn pipeline.
//!
//! A [`ChatSession`] owns the transcript and the playback controller. Each
//! submitted message is translated into the canonical language, answered by
//! the remote service, translated back into the user's language, and
//! appended as an assistant turn. Every failure ends in a fallback turn.

pub mod error;
pub mod negotiation;
pub mod orchestrator;
pub mod reset;
pub mod session;

pub use error::ChatError;
pub use negotiation::LanguageNegotiation;
pub use orchestrator::{fallback_message, RejectReason, SubmitOutcome};
pub use session::ChatSession;
