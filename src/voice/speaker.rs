//! Speak text: synthesize, decode and play behind a single busy gate

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use super::busy::BusyFlag;
use super::codec::decode_transport_encoding;
use super::pcm::{DecodedAudioBuffer, decode_pcm};
use super::playback::{AudioPlayback, Playback};
use super::tts::{AudioRequest, EncodedAudioPayload, SpeechSynthesizer, SynthesisOutcome};
use crate::{Error, Result};

/// Channel layout of synthesized speech
pub const PAYLOAD_CHANNELS: i32 = 1;

/// What happened to a speak request
#[derive(Debug)]
pub enum SpeakOutcome {
    /// Another request is in flight; nothing was done
    Busy,
    /// The service answered without audio
    NoAudio,
    /// Synthesis, decoding or playback failed
    Failed(Error),
    /// Audio is playing
    Playing(Playback),
}

/// What happened to a render request
#[derive(Debug)]
pub enum RenderOutcome {
    /// Another request is in flight; nothing was done
    Busy,
    /// The service answered without audio
    NoAudio,
    /// Decoded audio, ready to export
    Audio(DecodedAudioBuffer),
}

impl SpeakOutcome {
    /// Wait for playback to finish, if any started
    pub async fn finished(self) {
        if let Self::Playing(playback) = self {
            playback.wait().await;
        }
    }
}

/// Coordinates the speech pipeline for one session
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: Arc<Mutex<AudioPlayback>>,
    busy: Arc<BusyFlag>,
}

impl Speaker {
    /// Create a speaker over a synthesizer and a playback engine
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, playback: AudioPlayback) -> Self {
        Self {
            synthesizer,
            playback: Arc::new(Mutex::new(playback)),
            busy: BusyFlag::new(),
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Speak `text` in `language`
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`SpeakOutcome::Failed`], with the busy flag already cleared.
    pub async fn speak(&self, text: &str, language: &str) -> SpeakOutcome {
        let Some(guard) = self.busy.try_begin() else {
            tracing::debug!("speech request ignored while busy");
            return SpeakOutcome::Busy;
        };

        let request = AudioRequest::new(text, language);
        let payload = match self.synthesizer.synthesize(&request).await {
            Ok(SynthesisOutcome::Audio(payload)) => payload,
            Ok(SynthesisOutcome::Empty) => {
                tracing::debug!(provider = self.synthesizer.name(), "no audio produced");
                return SpeakOutcome::NoAudio;
            }
            Err(e) => {
                tracing::warn!(error = %e, provider = self.synthesizer.name(), "speech synthesis failed");
                return SpeakOutcome::Failed(e);
            }
        };

        let started = match decode_payload(&payload) {
            Ok(buffer) => self.start(buffer).await,
            Err(e) => Err(e),
        };
        let playback = match started {
            Ok(playback) => playback,
            Err(e) => {
                tracing::warn!(error = %e, "speech playback failed");
                return SpeakOutcome::Failed(e);
            }
        };

        // Hold the flag until the device reports completion
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            playback.wait().await;
            guard.end();
            let _ = tx.send(());
        });

        SpeakOutcome::Playing(Playback::new(rx))
    }

    /// Synthesize without playing, returning the decoded audio
    ///
    /// Shares the busy gate with [`Speaker::speak`].
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or decoding fails
    pub async fn render(&self, text: &str, language: &str) -> Result<RenderOutcome> {
        let Some(_guard) = self.busy.try_begin() else {
            return Ok(RenderOutcome::Busy);
        };

        let request = AudioRequest::new(text, language);
        match self.synthesizer.synthesize(&request).await? {
            SynthesisOutcome::Audio(payload) => decode_payload(&payload).map(RenderOutcome::Audio),
            SynthesisOutcome::Empty => Ok(RenderOutcome::NoAudio),
        }
    }

    /// Release the output device, interrupting any playback
    pub fn shutdown(&self) {
        match self.playback.lock() {
            Ok(mut playback) => playback.release(),
            Err(poisoned) => poisoned.into_inner().release(),
        }
    }

    /// How many times the output device has been opened
    #[must_use]
    pub fn device_open_count(&self) -> usize {
        self.playback
            .lock()
            .map_or(0, |playback| playback.output().open_count())
    }

    /// Start playback off the async workers; opening a device and starting
    /// a stream can block
    async fn start(&self, buffer: DecodedAudioBuffer) -> Result<Playback> {
        let playback = Arc::clone(&self.playback);
        tokio::task::spawn_blocking(move || {
            let mut playback = playback
                .lock()
                .map_err(|_| Error::Audio("playback lock poisoned".to_string()))?;
            playback.play(buffer)
        })
        .await
        .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Decode a service payload into samples
///
/// # Errors
///
/// Returns error if the payload is not valid base64 or the rate is unusable
pub fn decode_payload(payload: &EncodedAudioPayload) -> Result<DecodedAudioBuffer> {
    let bytes = decode_transport_encoding(&payload.data)?;
    let rate = i32::try_from(payload.sample_rate()).unwrap_or(0);
    decode_pcm(&bytes, rate, PAYLOAD_CHANNELS)
}
