//! Voice processing module
//!
//! Remote speech synthesis, payload decoding and playback.
//! [`Speaker`] ties the stages together behind a single busy gate

mod busy;
pub mod codec;
pub mod pcm;
mod playback;
mod speaker;
pub mod tts;

pub use busy::{BusyFlag, BusyGuard};
pub use codec::{decode_transport_encoding, encode_transport_encoding};
pub use pcm::{DecodedAudioBuffer, decode_pcm, resample, samples_to_wav};
pub use playback::{
    AudioBackend, AudioOutput, AudioPlayback, CpalBackend, OutputDevice, PLAYBACK_SAMPLE_RATE,
    Playback,
};
pub use speaker::{PAYLOAD_CHANNELS, RenderOutcome, SpeakOutcome, Speaker, decode_payload};
pub use tts::{
    AudioRequest, EncodedAudioPayload, GeminiTts, SpeechSynthesizer, SynthesisOutcome,
    resolve_voice,
};
