//! Shared test utilities
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use lingo_cards::voice::{
    AudioBackend, AudioPlayback, AudioRequest, DecodedAudioBuffer, EncodedAudioPayload,
    OutputDevice, SpeechSynthesizer, SynthesisOutcome,
};
use lingo_cards::{Error, LearnedWord, Result, VocabularyItem};
use tokio::sync::oneshot;

/// Base64 of the PCM samples 0, 16384, -32768, 32767 (little-endian)
pub const REFERENCE_PAYLOAD: &str = "AAAAQACA/38=";

/// Everything the fake device saw
#[derive(Default)]
pub struct DeviceLog {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub rendered: Mutex<Vec<DecodedAudioBuffer>>,
    pending: Mutex<Vec<oneshot::Sender<()>>>,
    /// How long `render` blocks before the stream counts as started
    pub start_delay_ms: AtomicU64,
}

impl DeviceLog {
    /// Complete every playback in flight
    pub fn finish_all(&self) {
        for done in self.pending.lock().unwrap().drain(..) {
            let _ = done.send(());
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }
}

/// Output backend that records instead of playing
pub struct FakeBackend(pub Arc<DeviceLog>);

struct FakeDevice {
    log: Arc<DeviceLog>,
    rate: u32,
    closed: bool,
}

impl AudioBackend for FakeBackend {
    fn open(&self, sample_rate: u32) -> Result<Box<dyn OutputDevice>> {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDevice {
            log: Arc::clone(&self.0),
            rate: sample_rate,
            closed: false,
        }))
    }
}

impl OutputDevice for FakeDevice {
    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn channels(&self) -> u16 {
        1
    }

    fn render(&mut self, buffer: DecodedAudioBuffer, done: oneshot::Sender<()>) -> Result<()> {
        let delay = self.log.start_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(std::time::Duration::from_millis(delay));
        }
        self.log.rendered.lock().unwrap().push(buffer);
        // completes only when the test calls `finish_all`
        self.log.pending.lock().unwrap().push(done);
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.closed.fetch_add(1, Ordering::SeqCst);
            // interrupted playback drops its completion senders
            self.log.pending.lock().unwrap().clear();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Playback engine over a fresh fake device
pub fn fake_playback() -> (AudioPlayback, Arc<DeviceLog>) {
    let log = Arc::new(DeviceLog::default());
    let playback = AudioPlayback::new(Arc::new(FakeBackend(Arc::clone(&log))));
    (playback, log)
}

/// What the fake synthesizer answers
#[derive(Clone)]
pub enum Reply {
    Audio(String),
    Empty,
    Fail,
}

/// Synthesizer with a scripted reply
pub struct FakeSynth {
    reply: Reply,
    pub requests: Mutex<Vec<AudioRequest>>,
}

impl FakeSynth {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, request: &AudioRequest) -> Result<SynthesisOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Audio(data) => Ok(SynthesisOutcome::Audio(EncodedAudioPayload {
                data: data.clone(),
                mime_type: Some("audio/L16;codec=pcm;rate=24000".to_string()),
            })),
            Reply::Empty => Ok(SynthesisOutcome::Empty),
            Reply::Fail => Err(Error::Synthesis("service unavailable".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// A vocabulary item with predictable fields
pub fn item(id: &str, translation: &str) -> VocabularyItem {
    VocabularyItem {
        id: id.to_string(),
        word: format!("word-{id}"),
        translation: translation.to_string(),
        phrase: format!("phrase-{id}"),
        phrase_translation: format!("frase-{id}"),
        pronunciation: None,
    }
}

/// A learned word in `lang`, learned at `millis`
pub fn learned(id: &str, translation: &str, lang: &str, millis: i64) -> LearnedWord {
    LearnedWord {
        item: item(id, translation),
        lang: lang.to_string(),
        level: Some("B1".to_string()),
        learned_at: Utc.timestamp_millis_opt(millis).unwrap(),
    }
}
