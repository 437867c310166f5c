use thiserror::Error;

/// Top-level error type for the NutriBot system.
///
/// Covers configuration and plumbing failures. The turn pipeline's own
/// failure taxonomy (translation, query, playback) lives in the subsystem
/// crates and never escapes the orchestrator as a `NutribotError`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NutribotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for NutribotError {
    fn from(err: toml::de::Error) -> Self {
        NutribotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for NutribotError {
    fn from(err: toml::ser::Error) -> Self {
        NutribotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for NutribotError {
    fn from(err: serde_json::Error) -> Self {
        NutribotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for NutriBot operations.
pub type Result<T> = std::result::Result<T, NutribotError>;
