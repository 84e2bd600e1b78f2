//! Text-to-speech (TTS) synthesis via the Gemini `generateContent` API

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::TtsConfig;
use crate::{Error, Result};

/// Rate assumed when the service does not report one
pub const DEFAULT_PAYLOAD_SAMPLE_RATE: u32 = 24000;

/// Voice used for any language without a dedicated entry
pub const DEFAULT_VOICE: &str = "Zephyr";

/// Resolve the prebuilt voice for a language code
///
/// Unknown codes fall back to the English voice.
#[must_use]
pub fn resolve_voice(language_code: &str) -> &'static str {
    match language_code {
        "de" => "Fenrir",
        "fr" => "Charon",
        "es" => "Kore",
        _ => DEFAULT_VOICE,
    }
}

/// A single synthesis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRequest {
    /// Text to speak
    pub text: String,
    /// Target language code (e.g. "en")
    pub language: String,
    /// Prebuilt voice identifier
    pub voice: String,
}

impl AudioRequest {
    /// Build a request, resolving the voice from the language
    #[must_use]
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        let language = language.into();
        let voice = resolve_voice(&language).to_string();
        Self {
            text: text.into(),
            language,
            voice,
        }
    }

    /// Instruction sent to the model
    #[must_use]
    pub fn instruction(&self) -> String {
        format!("Speak clearly in {}: {}", self.language, self.text)
    }
}

/// Base64 audio returned by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudioPayload {
    /// Transport-encoded PCM bytes
    pub data: String,
    /// MIME type, e.g. `audio/L16;codec=pcm;rate=24000`
    pub mime_type: Option<String>,
}

impl EncodedAudioPayload {
    /// Sample rate declared in the MIME type, or the service default
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.mime_type
            .as_deref()
            .and_then(|mime| {
                mime.split(';')
                    .filter_map(|param| param.trim().strip_prefix("rate="))
                    .find_map(|rate| rate.parse().ok())
            })
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_PAYLOAD_SAMPLE_RATE)
    }
}

/// Result of a successful call to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Audio was produced
    Audio(EncodedAudioPayload),
    /// The service answered without audio
    Empty,
}

/// Speech synthesis backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for a request
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` on network, protocol or service failure
    async fn synthesize(&self, request: &AudioRequest) -> Result<SynthesisOutcome>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Gemini TTS client
pub struct GeminiTts {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiTts {
    /// Create a new client from TTS configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(api_key: Option<SecretString>, config: &TtsConfig) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| Error::Config("Gemini API key required for TTS".to_string()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn call(&self, request: &AudioRequest) -> Result<SynthesisOutcome> {
        let body = GenerateContentRequest::for_speech(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("Gemini TTS error {status}: {body}")));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(parsed.into_outcome())
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiTts {
    async fn synthesize(&self, request: &AudioRequest) -> Result<SynthesisOutcome> {
        tracing::debug!(
            language = %request.language,
            voice = %request.voice,
            chars = request.text.len(),
            "requesting speech synthesis"
        );

        match self.call(request).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(error = %e, model = %self.model, "speech synthesis failed");
                Err(match e {
                    Error::Synthesis(_) => e,
                    other => Error::Synthesis(other.to_string()),
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn for_speech(request: &AudioRequest) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(request.instruction()),
                    inline_data: None,
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                candidate_count: 1,
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: request.voice.clone(),
                        },
                    },
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    candidate_count: u32,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Take the inline audio of the first part of the first candidate
    fn into_outcome(self) -> SynthesisOutcome {
        let inline = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.inline_data);

        match inline {
            Some(InlineData {
                data: Some(data),
                mime_type,
            }) if !data.is_empty() => SynthesisOutcome::Audio(EncodedAudioPayload { data, mime_type }),
            _ => SynthesisOutcome::Empty,
        }
    }
}
