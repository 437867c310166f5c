//! NutriBot answering-service client.
//!
//! The answering service receives canonical-language text and replies with
//! an answer and its citations. Failures never escape as panics or raw
//! transport errors; they are folded into [`QueryFailed`].

pub mod error;
pub mod http;

use async_trait::async_trait;

use nutribot_core::types::Citation;

pub use error::QueryFailed;
pub use http::HttpAnswerClient;

/// A successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Answer text in the canonical language.
    pub text: String,
    /// Citations in the order the service returned them.
    pub sources: Vec<Citation>,
}

/// Client for the remote answering service.
#[async_trait]
pub trait AnswerClient: Send + Sync {
    /// Ask the service a question in the canonical language.
    async fn query(&self, text: &str) -> Result<Answer, QueryFailed>;

    /// Ask the service to drop its conversation history.
    async fn notify_reset(&self) -> Result<(), QueryFailed>;
}
