use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NutribotError;

/// Language every query is translated into before it reaches the answering service.
///
/// Not configurable; turns without a language code are in this language.
pub const CANONICAL_LANGUAGE: &str = "en";

/// Languages offered by the preference selector (besides `auto`).
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "hi", "te"];

// =============================================================================
// Languages
// =============================================================================

/// An ISO-639-like language code such as `en`, `hi`, or `zh-cn`.
///
/// Stored lowercased. Any code the translation service reports is accepted;
/// only the preference selector is restricted to [`SUPPORTED_LANGUAGES`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and normalize a language code.
    pub fn new(code: &str) -> Result<Self, NutribotError> {
        let trimmed = code.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= 12
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(NutribotError::InvalidLanguage(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The canonical language (English).
    pub fn canonical() -> Self {
        Self(CANONICAL_LANGUAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_canonical(&self) -> bool {
        self.0 == CANONICAL_LANGUAGE
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = NutribotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = NutribotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

/// The user's output-language preference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PreferredLanguage {
    /// Reply in whatever language the user wrote in.
    #[default]
    Auto,
    /// Always reply in this language.
    Specific(LanguageCode),
}

impl PreferredLanguage {
    /// The language the reply should be rendered in, given what the
    /// translation service detected in the user's input.
    pub fn resolve(&self, detected: &LanguageCode) -> LanguageCode {
        match self {
            PreferredLanguage::Auto => detected.clone(),
            PreferredLanguage::Specific(code) => code.clone(),
        }
    }
}

impl fmt::Display for PreferredLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferredLanguage::Auto => f.write_str("auto"),
            PreferredLanguage::Specific(code) => write!(f, "{}", code),
        }
    }
}

impl FromStr for PreferredLanguage {
    type Err = NutribotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "auto" {
            return Ok(PreferredLanguage::Auto);
        }
        if SUPPORTED_LANGUAGES.contains(&normalized.as_str()) {
            return Ok(PreferredLanguage::Specific(LanguageCode::new(&normalized)?));
        }
        Err(NutribotError::InvalidLanguage(format!(
            "{} (expected auto, {})",
            s,
            SUPPORTED_LANGUAGES.join(", ")
        )))
    }
}

impl TryFrom<String> for PreferredLanguage {
    type Error = NutribotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PreferredLanguage> for String {
    fn from(pref: PreferredLanguage) -> Self {
        pref.to_string()
    }
}

// =============================================================================
// Transcript
// =============================================================================

/// Monotonic turn identifier. Never reused within a process, even across resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A citation attached to an assistant answer.
///
/// The answering service only guarantees an optional `title`; anything else
/// it sends is kept verbatim in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Citation {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// Title to show in the transcript.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Source")
    }
}

/// One message in the conversation transcript.
///
/// Turns are created by the session and never mutated after they are stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub content: String,
    /// Citations (assistant turns only).
    #[serde(default)]
    pub sources: Vec<Citation>,
    pub created_at: DateTime<Utc>,
    /// Language `content` is written in (assistant turns only). `None` means canonical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<LanguageCode>,
}

impl Turn {
    /// A user turn holding the raw input verbatim.
    pub fn user(id: TurnId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
            created_at: Utc::now(),
            language_code: None,
        }
    }

    pub fn assistant(
        id: TurnId,
        content: impl Into<String>,
        sources: Vec<Citation>,
        language_code: Option<LanguageCode>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            sources,
            created_at: Utc::now(),
            language_code,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Language of `content`, falling back to canonical when unset.
    pub fn effective_language(&self) -> LanguageCode {
        self.language_code
            .clone()
            .unwrap_or_else(LanguageCode::canonical)
    }
}

// =============================================================================
// Playback
// =============================================================================

/// Speech playback status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Speaking,
}

impl PlaybackStatus {
    /// Label for the per-turn read-aloud control.
    pub fn control_label(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "Read Aloud",
            PlaybackStatus::Speaking => "Stop Speaking",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Speaking => write!(f, "speaking"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code_normalizes() {
        let code = LanguageCode::new("  HI ").unwrap();
        assert_eq!(code.as_str(), "hi");
        assert!(!code.is_canonical());
        assert!(LanguageCode::new("EN").unwrap().is_canonical());
    }

    #[test]
    fn test_language_code_rejects_garbage() {
        assert!(LanguageCode::new("").is_err());
        assert!(LanguageCode::new("   ").is_err());
        assert!(LanguageCode::new("en us").is_err());
        assert!(LanguageCode::new("a-very-long-language-tag").is_err());
    }

    #[test]
    fn test_language_code_accepts_region_subtag() {
        assert_eq!(LanguageCode::new("zh-CN").unwrap().as_str(), "zh-cn");
    }

    #[test]
    fn test_preferred_language_parse() {
        assert_eq!("auto".parse::<PreferredLanguage>().unwrap(), PreferredLanguage::Auto);
        assert_eq!(
            "Te".parse::<PreferredLanguage>().unwrap(),
            PreferredLanguage::Specific(LanguageCode::new("te").unwrap())
        );
        assert!("fr".parse::<PreferredLanguage>().is_err());
    }

    #[test]
    fn test_preferred_language_resolve() {
        let hi = LanguageCode::new("hi").unwrap();
        assert_eq!(PreferredLanguage::Auto.resolve(&hi), hi);

        let en = PreferredLanguage::Specific(LanguageCode::canonical());
        assert_eq!(en.resolve(&hi), LanguageCode::canonical());
    }

    #[test]
    fn test_preferred_language_serde_roundtrip() {
        let pref = PreferredLanguage::Specific(LanguageCode::new("hi").unwrap());
        let json = serde_json::to_string(&pref).unwrap();
        assert_eq!(json, "\"hi\"");
        let back: PreferredLanguage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pref);
    }

    #[test]
    fn test_turn_effective_language_defaults_to_canonical() {
        let turn = Turn::assistant(TurnId(2), "Hello", vec![], None);
        assert_eq!(turn.effective_language(), LanguageCode::canonical());
        assert!(turn.is_assistant());

        let user = Turn::user(TurnId(1), "  raw input ");
        assert_eq!(user.content, "  raw input ");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_citation_keeps_unknown_fields() {
        let json = r#"{"title":"Oats","score":0.9}"#;
        let citation: Citation = serde_json::from_str(json).unwrap();
        assert_eq!(citation.display_title(), "Oats");
        assert_eq!(citation.extra.get("score").and_then(|v| v.as_f64()), Some(0.9));

        let untitled: Citation = serde_json::from_str("{}").unwrap();
        assert_eq!(untitled.display_title(), "Source");
    }

    #[test]
    fn test_playback_status_labels() {
        assert_eq!(PlaybackStatus::default(), PlaybackStatus::Idle);
        assert_eq!(PlaybackStatus::Idle.control_label(), "Read Aloud");
        assert_eq!(PlaybackStatus::Speaking.control_label(), "Stop Speaking");
        assert_eq!(PlaybackStatus::Speaking.to_string(), "speaking");
    }
}
