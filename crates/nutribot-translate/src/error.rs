//! Error types for the translation client.

/// The translation round trip failed or returned something unusable.
///
/// Every variant means the same thing to the turn pipeline ("translation
/// unavailable"); the split exists for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    #[error("translation unavailable: input text is empty")]
    EmptyInput,
    #[error("translation unavailable: transport error: {0}")]
    Transport(String),
    #[error("translation unavailable: service returned HTTP {0}")]
    Status(u16),
    #[error("translation unavailable: malformed response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_error_display() {
        assert_eq!(
            TranslationError::EmptyInput.to_string(),
            "translation unavailable: input text is empty"
        );
        assert_eq!(
            TranslationError::Status(503).to_string(),
            "translation unavailable: service returned HTTP 503"
        );
        assert!(TranslationError::Malformed("no fragments".into())
            .to_string()
            .contains("no fragments"));
    }
}
