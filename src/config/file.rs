//! TOML configuration file loading
//!
//! Supports `~/.config/lingo/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct LingoConfigFile {
    /// Target language code (e.g. "en")
    #[serde(default)]
    pub language: Option<String>,

    /// Directory for the progress database
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Speech synthesis configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Review quiz configuration
    #[serde(default)]
    pub quiz: QuizFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Service base URL
    pub base_url: Option<String>,

    /// TTS model (e.g. "gemini-2.5-flash-preview-tts")
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Review quiz configuration
#[derive(Debug, Default, Deserialize)]
pub struct QuizFileConfig {
    /// Questions per session
    pub size: Option<usize>,

    /// Wrong options per question
    pub distractors: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    /// Gemini API key
    pub gemini: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `LingoConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> LingoConfigFile {
    let Some(path) = config_file_path() else {
        return LingoConfigFile::default();
    };

    if !path.exists() {
        return LingoConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config_file(&content).unwrap_or_else(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config file, using defaults"
            );
            LingoConfigFile::default()
        }),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            LingoConfigFile::default()
        }
    }
}

/// Parse config file content
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> crate::Result<LingoConfigFile> {
    let config = toml::from_str(content)?;
    tracing::info!("loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/lingo/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("lingo").join("config.toml"))
}
