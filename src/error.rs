//! Error types for Lingo Cards

use thiserror::Error;

/// Result type alias for Lingo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Lingo Cards
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or rendering error
    #[error("audio error: {0}")]
    Audio(String),

    /// Transport-encoded audio payload could not be decoded
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// PCM decoder was given a nonsensical layout
    #[error("invalid audio parameters: sample rate {sample_rate}, channels {channels}")]
    InvalidAudioParameters {
        /// Requested sample rate
        sample_rate: i64,
        /// Requested channel count
        channels: i64,
    },

    /// Speech synthesis service failure
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Content catalog error
    #[error("catalog error: {0}")]
    Catalog(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
