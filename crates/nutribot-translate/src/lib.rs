//! NutriBot translation crate.
//!
//! Provides the `TranslationClient` abstraction used by the turn pipeline,
//! an HTTP implementation for the GTX endpoint, and a pass-through client for
//! running without a translation service.

pub mod error;
pub mod gtx;

use async_trait::async_trait;

use nutribot_core::types::LanguageCode;

pub use error::TranslationError;
pub use gtx::GtxTranslationClient;

// =============================================================================
// Result types
// =============================================================================

/// A completed translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Translated text.
    pub text: String,
    /// Language the service detected in the input (or the caller's hint).
    pub detected_source: LanguageCode,
}

// =============================================================================
// Trait
// =============================================================================

/// Service that translates text between languages.
#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// Translate `text` into `target`.
    ///
    /// # Arguments
    /// * `text` - Non-empty, already trimmed input.
    /// * `target` - Language to translate into.
    /// * `source_hint` - Known source language, or `None` to auto-detect.
    ///
    /// When the service does not report a detected language, the result
    /// carries `source_hint`, or `target` when auto-detecting.
    async fn translate(
        &self,
        text: &str,
        target: &LanguageCode,
        source_hint: Option<&LanguageCode>,
    ) -> Result<Translation, TranslationError>;
}

// =============================================================================
// Pass-through implementation
// =============================================================================

/// Translator that returns its input unchanged.
///
/// Used when no translation service is configured: every message is assumed
/// to already be in the requested language.
#[derive(Debug, Clone, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl TranslationClient for PassthroughTranslator {
    async fn translate(
        &self,
        text: &str,
        target: &LanguageCode,
        source_hint: Option<&LanguageCode>,
    ) -> Result<Translation, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }
        Ok(Translation {
            text: text.to_string(),
            detected_source: source_hint.cloned().unwrap_or_else(|| target.clone()),
        })
    }
}
