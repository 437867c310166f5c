use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{NutribotError, Result};
use crate::types::PreferredLanguage;

/// Top-level configuration for NutriBot.
///
/// Loaded from `~/.nutribot/config.toml` by default. Every section is
/// optional in the file and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutribotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl NutribotConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NutribotConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        self.session.default_language.parse::<PreferredLanguage>()?;

        if !self.translation.endpoint.starts_with("http://")
            && !self.translation.endpoint.starts_with("https://")
        {
            return Err(NutribotError::Config(format!(
                "translation.endpoint must be an http(s) URL, got {}",
                self.translation.endpoint
            )));
        }
        if !self.answer.base_url.starts_with("http://")
            && !self.answer.base_url.starts_with("https://")
        {
            return Err(NutribotError::Config(format!(
                "answer.base_url must be an http(s) URL, got {}",
                self.answer.base_url
            )));
        }
        if self.translation.timeout_secs == 0 || self.answer.timeout_secs == 0 {
            return Err(NutribotError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.answer.reset_command.trim().is_empty() {
            return Err(NutribotError::Config(
                "answer.reset_command must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Translation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// GET endpoint of the GTX-style translation service.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Answering service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Base URL of the answering service.
    pub base_url: String,
    /// Path of the search endpoint.
    pub search_path: String,
    /// Query text that asks the service to forget its history.
    pub reset_command: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            search_path: "/api/search".to_string(),
            reset_command: "RESET_CHAT".to_string(),
            timeout_secs: 60,
        }
    }
}

impl AnswerConfig {
    /// Full URL of the search endpoint.
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_start_matches('/')
        )
    }
}

/// Speech playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether read-aloud is available at all.
    pub enabled: bool,
    /// Synthesizer executable used by the command-line backend.
    pub command: String,
    /// Substrings in a voice name that suggest a higher quality voice.
    pub quality_markers: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "espeak-ng".to_string(),
            quality_markers: vec!["Google".to_string(), "Natural".to_string()],
        }
    }
}

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Initial output-language preference: `auto`, `en`, `hi`, or `te`.
    pub default_language: String,
    /// Capacity of the domain event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_language: "auto".to_string(),
            event_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = NutribotConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.answer.base_url, "http://localhost:5000");
        assert_eq!(config.answer.reset_command, "RESET_CHAT");
        assert_eq!(config.speech.quality_markers, vec!["Google", "Natural"]);
        assert_eq!(config.session.default_language, "auto");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_search_url_joins_slashes() {
        let mut answer = AnswerConfig::default();
        assert_eq!(answer.search_url(), "http://localhost:5000/api/search");

        answer.base_url = "http://example.org:8080/".to_string();
        answer.search_path = "api/search".to_string();
        assert_eq!(answer.search_url(), "http://example.org:8080/api/search");
    }

    #[test]
    fn test_load_partial_config() {
        let file = create_temp_config(
            r#"
[answer]
base_url = "http://10.0.0.2:5000"

[session]
default_language = "hi"
"#,
        );
        let config = NutribotConfig::load(file.path()).unwrap();
        assert_eq!(config.answer.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.answer.search_path, "/api/search");
        assert_eq!(config.session.default_language, "hi");
        assert_eq!(config.translation.timeout_secs, 10);
    }

    #[test]
    fn test_load_rejects_unsupported_language() {
        let file = create_temp_config("[session]\ndefault_language = \"fr\"\n");
        assert!(NutribotConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_bad_url() {
        let file = create_temp_config("[answer]\nbase_url = \"localhost:5000\"\n");
        let err = NutribotConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("answer.base_url"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = NutribotConfig::load_or_default(Path::new("/nonexistent/nutribot.toml"));
        assert_eq!(config.answer.timeout_secs, 60);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = NutribotConfig::default();
        config.speech.command = "spd-say".to_string();
        config.session.default_language = "te".to_string();
        config.save(&path).unwrap();

        let reloaded = NutribotConfig::load(&path).unwrap();
        assert_eq!(reloaded.speech.command, "spd-say");
        assert_eq!(reloaded.session.default_language, "te");
    }
}
