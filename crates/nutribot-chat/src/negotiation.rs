//! Per-turn language negotiation.

use nutribot_core::types::{LanguageCode, PreferredLanguage};
use nutribot_translate::Translation;

/// Outcome of translating one user message into the canonical language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageNegotiation {
    /// The user's message in the canonical language.
    pub canonical_text: String,
    /// What the translation service detected in the raw input.
    pub detected_source_language: LanguageCode,
    /// Language the reply will be rendered in.
    pub resolved_output_language: LanguageCode,
}

impl LanguageNegotiation {
    /// Combine a forward translation with the session's preference.
    ///
    /// A specific preference always wins; `auto` follows the detected language.
    pub fn negotiate(translation: Translation, preferred: &PreferredLanguage) -> Self {
        let resolved_output_language = preferred.resolve(&translation.detected_source);
        Self {
            canonical_text: translation.text,
            detected_source_language: translation.detected_source,
            resolved_output_language,
        }
    }

    /// Whether the answer must be translated back before display.
    pub fn needs_back_translation(&self, canonical: &LanguageCode) -> bool {
        &self.resolved_output_language != canonical
    }
}
