//! Configuration loading.
//!
//! A single TOML file at the platform config dir
//! (`~/.config/voicebridge/config.toml` on Linux). A missing file yields
//! defaults; a malformed file is a startup error. Every field has a serde
//! default so partial files stay valid across releases.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::Language;
use crate::error::WorkflowError;

/// Environment variable consulted when `transcription.api_key` is empty.
pub const STT_KEY_ENV: &str = "VOICEBRIDGE_STT_API_KEY";

// ── Sections ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default target language code for a fresh session.
    pub default_target: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_target: "fr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// RMS level above which the recorder considers speech to have started.
    pub onset_threshold: f32,
    /// Milliseconds of quiet after speech onset that end the utterance.
    pub trailing_silence_ms: u64,
    /// How long a one-shot capture waits for speech onset before giving up.
    pub speech_wait_ms: u64,
    /// Bounded utterance window for real-time iterations, in seconds.
    pub phrase_time_limit_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            onset_threshold: 0.015,
            trailing_silence_ms: 700,
            speech_wait_ms: 6000,
            phrase_time_limit_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// OpenAI-compatible API base, e.g. `https://api.groq.com/openai/v1`.
    pub endpoint: String,
    /// Bearer token. Falls back to [`STT_KEY_ENV`] when empty.
    pub api_key: String,
    /// Transcription model identifier.
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: "whisper-large-v3".to_string(),
        }
    }
}

impl TranscriptionConfig {
    /// Configured key or the environment fallback.
    pub fn resolved_api_key(&self) -> String {
        if !self.api_key.trim().is_empty() {
            return self.api_key.clone();
        }
        std::env::var(STT_KEY_ENV).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of the translation endpoint (overridable for tests).
    pub base_url: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Base URL of the TTS endpoint (overridable for tests).
    pub base_url: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Override for the history CSV location.
    pub path: Option<PathBuf>,
}

impl HistoryConfig {
    /// Effective log location: the override, or the platform data dir.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "voicebridge")
            .map(|dirs| dirs.data_dir().join("translation_history.csv"))
            .unwrap_or_else(|| PathBuf::from("translation_history.csv"))
    }
}

// ── Top level ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub capture: CaptureConfig,
    pub transcription: TranscriptionConfig,
    pub translation: TranslationConfig,
    pub synthesis: SynthesisConfig,
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load from the default location, or defaults if the file is absent.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path. The file must exist and parse.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Default config file location for this platform.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "voicebridge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parse the configured default target into a catalog language.
    pub fn default_target(&self) -> Result<Language, WorkflowError> {
        Language::from_code(&self.general.default_target)
            .ok_or_else(|| WorkflowError::UnknownLanguage(self.general.default_target.clone()))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.general.default_target, "fr");
        assert_eq!(config.default_target().unwrap(), Language::French);
        assert_eq!(config.capture.phrase_time_limit_secs, 5);
        assert!(config.translation.base_url.starts_with("https://"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[general]\ndefault_target = \"ko\"\n\n[capture]\nphrase_time_limit_secs = 8\n"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_target().unwrap(), Language::Korean);
        assert_eq!(config.capture.phrase_time_limit_secs, 8);
        // Untouched sections fall back to defaults.
        assert_eq!(config.capture.trailing_silence_ms, 700);
        assert_eq!(config.transcription.model, "whisper-large-v3");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "general = \"not a table\"").unwrap();
        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn bad_default_target_is_reported() {
        let config = AppConfig {
            general: GeneralConfig {
                default_target: "xx".into(),
            },
            ..Default::default()
        };
        assert!(matches!(
            config.default_target(),
            Err(WorkflowError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn history_path_override_wins() {
        let config = HistoryConfig {
            path: Some(PathBuf::from("/tmp/history.csv")),
        };
        assert_eq!(config.resolved_path(), PathBuf::from("/tmp/history.csv"));
    }
}
