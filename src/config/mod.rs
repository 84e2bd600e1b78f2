//! Configuration management for Lingo Cards

pub mod file;

use std::path::PathBuf;

use secrecy::SecretString;

use crate::quiz::{DEFAULT_DISTRACTORS, DEFAULT_QUIZ_SIZE};
use crate::{Error, Result};

/// Default synthesis service
pub const DEFAULT_TTS_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default synthesis model
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default target language
pub const DEFAULT_LANGUAGE: &str = "en";

/// Lingo Cards configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Target language code
    pub language: String,

    /// Path to data directory (progress database)
    pub data_dir: PathBuf,

    /// Credential for the synthesis service
    pub api_key: Option<SecretString>,

    /// Speech synthesis configuration
    pub tts: TtsConfig,

    /// Review quiz configuration
    pub quiz: QuizConfig,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Service base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Request timeout; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TTS_BASE_URL.to_string(),
            model: DEFAULT_TTS_MODEL.to_string(),
            timeout_secs: None,
        }
    }
}

/// Review quiz configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    /// Questions per session
    pub size: usize,

    /// Wrong options per question
    pub distractors: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_QUIZ_SIZE,
            distractors: DEFAULT_DISTRACTORS,
        }
    }
}

/// Default data directory: `~/.local/share/lingo/` on Linux
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "lingo", "lingo")
        .map_or_else(|| PathBuf::from(".lingo"), |d| d.data_dir().to_path_buf())
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range
    pub fn load() -> Result<Self> {
        Self::load_with_language(None)
    }

    /// Load configuration, overriding the target language
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range
    pub fn load_with_language(language: Option<&str>) -> Result<Self> {
        let fc = file::load_config_file();
        let mut config = Self::from_sources(fc, |key| std::env::var(key).ok())?;
        if let Some(language) = language {
            config.language = language.to_string();
        }
        Ok(config)
    }

    /// Merge a config file with an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range
    pub fn from_sources(
        fc: file::LingoConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = env("GEMINI_API_KEY")
            .or_else(|| env("API_KEY"))
            .or(fc.api_keys.gemini)
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let timeout_secs = match env("LINGO_TTS_TIMEOUT_SECS") {
            Some(raw) => Some(raw.parse().map_err(|_| {
                Error::Config(format!("LINGO_TTS_TIMEOUT_SECS must be an integer, got {raw:?}"))
            })?),
            None => fc.tts.timeout_secs,
        };

        let tts = TtsConfig {
            base_url: env("LINGO_TTS_BASE_URL")
                .or(fc.tts.base_url)
                .unwrap_or_else(|| DEFAULT_TTS_BASE_URL.to_string()),
            model: env("LINGO_TTS_MODEL")
                .or(fc.tts.model)
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            timeout_secs: timeout_secs.filter(|secs| *secs > 0),
        };

        let quiz = QuizConfig {
            size: fc.quiz.size.unwrap_or(DEFAULT_QUIZ_SIZE),
            distractors: fc.quiz.distractors.unwrap_or(DEFAULT_DISTRACTORS),
        };
        if quiz.size == 0 {
            return Err(Error::Config("quiz.size must be at least 1".to_string()));
        }

        Ok(Self {
            language: env("LINGO_LANG")
                .or(fc.language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            data_dir: env("LINGO_DATA_DIR")
                .or(fc.data_dir)
                .map_or_else(default_data_dir, PathBuf::from),
            api_key,
            tts,
            quiz,
        })
    }

    /// Path of the progress database
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("lingo.db")
    }
}
