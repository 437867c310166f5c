//! Error types for the chat session.

use nutribot_core::events::FallbackReason;
use nutribot_core::types::TurnId;
use nutribot_search::QueryFailed;
use nutribot_translate::TranslationError;

/// Errors from the chat session.
///
/// Pipeline failures never reach the caller of `submit`; they are turned
/// into a fallback assistant turn. The remaining variants come from
/// transcript lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Query(#[from] QueryFailed),
    #[error("turn not found: {0}")]
    TurnNotFound(TurnId),
    #[error("turn {0} is not an assistant reply")]
    NotAssistantTurn(TurnId),
}

impl ChatError {
    /// Fallback category for a pipeline failure, or `None` for lookup errors.
    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            ChatError::Translation(_) => Some(FallbackReason::TranslationUnavailable),
            ChatError::Query(e) if e.is_rejection() => Some(FallbackReason::QueryRejected),
            ChatError::Query(_) => Some(FallbackReason::QueryTransport),
            ChatError::TurnNotFound(_) | ChatError::NotAssistantTurn(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::TurnNotFound(TurnId(4));
        assert_eq!(err.to_string(), "turn not found: #4");

        let err = ChatError::NotAssistantTurn(TurnId(1));
        assert_eq!(err.to_string(), "turn #1 is not an assistant reply");

        let err = ChatError::from(QueryFailed::Transport("refused".into()));
        assert_eq!(err.to_string(), "answering service unreachable: refused");
    }

    #[test]
    fn test_fallback_reason_mapping() {
        assert_eq!(
            ChatError::from(TranslationError::Status(429)).fallback_reason(),
            Some(FallbackReason::TranslationUnavailable)
        );
        assert_eq!(
            ChatError::from(QueryFailed::Rejected { message: None }).fallback_reason(),
            Some(FallbackReason::QueryRejected)
        );
        assert_eq!(
            ChatError::from(QueryFailed::Status { status: 500, message: None }).fallback_reason(),
            Some(FallbackReason::QueryRejected)
        );
        assert_eq!(
            ChatError::from(QueryFailed::Malformed("eof".into())).fallback_reason(),
            Some(FallbackReason::QueryTransport)
        );
        assert_eq!(ChatError::TurnNotFound(TurnId(9)).fallback_reason(), None);
    }
}
