//! Error types for the answering-service client.

/// The answering service could not produce an answer.
///
/// A service that could not be reached is told apart from one that was
/// reached and failed to answer, since the two get different fallback text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryFailed {
    #[error("query text is empty")]
    EmptyQuery,
    #[error("answering service unreachable: {0}")]
    Transport(String),
    #[error("answering service returned HTTP {status}")]
    Status { status: u16, message: Option<String> },
    #[error("answering service sent a malformed response: {0}")]
    Malformed(String),
    #[error("answering service reported failure")]
    Rejected { message: Option<String> },
}

impl QueryFailed {
    /// Whether the service was reached but did not answer: an error status
    /// or `success: false`.
    pub fn is_rejection(&self) -> bool {
        matches!(self, QueryFailed::Rejected { .. } | QueryFailed::Status { .. })
    }
}
