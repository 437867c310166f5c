//! CLI argument definitions for the NutriBot application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use nutribot_core::error::NutribotError;
use nutribot_core::types::PreferredLanguage;

/// NutriBot - a multilingual nutrition assistant for the terminal.
#[derive(Parser, Debug)]
#[command(name = "nutribot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the answering service, e.g. http://localhost:5000.
    #[arg(short = 's', long = "server")]
    pub server: Option<String>,

    /// Reply language: auto, en, hi or te.
    #[arg(short = 'L', long = "language")]
    pub language: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Disable read-aloud.
    #[arg(long = "no-speech")]
    pub no_speech: bool,

    /// Send messages to the answering service untranslated.
    #[arg(long = "no-translate")]
    pub no_translate: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > NUTRIBOT_CONFIG env var > ~/.nutribot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("NUTRIBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the answering service URL.
    ///
    /// Priority: --server flag > NUTRIBOT_SERVER env var.
    /// Returns `None` to keep the config file value.
    pub fn resolve_server(&self) -> Option<String> {
        if let Some(ref s) = self.server {
            return Some(s.clone());
        }
        std::env::var("NUTRIBOT_SERVER")
            .ok()
            .filter(|s| !s.trim().is_empty())
    }

    /// Resolve the reply language.
    ///
    /// Priority: --language flag > config file value.
    pub fn resolve_language(&self, config_default: &str) -> Result<PreferredLanguage, NutribotError> {
        self.language
            .as_deref()
            .unwrap_or(config_default)
            .parse()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".nutribot").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".nutribot").join("config.toml");
    }
    PathBuf::from("config.toml")
}
