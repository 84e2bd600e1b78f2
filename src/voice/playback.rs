//! Audio playback to speakers

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, sync_channel};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use tokio::sync::oneshot;

use super::pcm::{DecodedAudioBuffer, resample};
use crate::{Error, Result};

/// Rendering rate of the output device (matches TTS output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Opens output devices
pub trait AudioBackend: Send + Sync {
    /// Open an output device rendering at `sample_rate`
    ///
    /// # Errors
    ///
    /// Returns error if no suitable device is available
    fn open(&self, sample_rate: u32) -> Result<Box<dyn OutputDevice>>;
}

/// An open output device
pub trait OutputDevice: Send {
    /// Rendering rate in Hz
    fn sample_rate(&self) -> u32;

    /// Output channel count
    fn channels(&self) -> u16;

    /// Start rendering `buffer`, returning once playback has started
    ///
    /// `done` must be signalled exactly once, when rendering ends or the
    /// device is closed.
    ///
    /// # Errors
    ///
    /// Returns error if the device is closed or rendering cannot start
    fn render(&mut self, buffer: DecodedAudioBuffer, done: oneshot::Sender<()>) -> Result<()>;

    /// Release the device. Calling this more than once has no effect
    fn close(&mut self);

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;
}

/// Completion signal for one playback
#[derive(Debug)]
pub struct Playback {
    done: oneshot::Receiver<()>,
}

impl Playback {
    /// Wrap a completion receiver
    #[must_use]
    pub const fn new(done: oneshot::Receiver<()>) -> Self {
        Self { done }
    }

    /// A playback that has already finished
    #[must_use]
    pub fn finished() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        Self { done: rx }
    }

    /// Wait until rendering ends
    ///
    /// A dropped sender counts as finished, so this always resolves once
    /// the device lets go of the buffer.
    pub async fn wait(self) {
        let _ = self.done.await;
    }
}

/// Lazily opened, reusable output device
pub struct AudioOutput {
    backend: Arc<dyn AudioBackend>,
    sample_rate: u32,
    device: Option<Box<dyn OutputDevice>>,
    opened: usize,
}

impl AudioOutput {
    /// Create a holder; no device is opened until `acquire`
    #[must_use]
    pub fn new(backend: Arc<dyn AudioBackend>, sample_rate: u32) -> Self {
        Self {
            backend,
            sample_rate,
            device: None,
            opened: 0,
        }
    }

    /// Return the open device, opening it first if needed
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails to open a device
    pub fn acquire(&mut self) -> Result<&mut dyn OutputDevice> {
        if self.device.as_ref().is_some_and(|d| d.is_closed()) {
            self.device = None;
        }

        if self.device.is_none() {
            let device = self.backend.open(self.sample_rate)?;
            self.opened += 1;
            tracing::debug!(
                sample_rate = device.sample_rate(),
                channels = device.channels(),
                opened = self.opened,
                "output device opened"
            );
            self.device = Some(device);
        }

        match self.device.as_deref_mut() {
            Some(device) => Ok(device),
            None => Err(Error::Audio("output device unavailable".to_string())),
        }
    }

    /// Close the device if it is open
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.close();
            tracing::debug!("output device released");
        }
    }

    /// Whether a usable device is held
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.device.as_ref().is_some_and(|d| !d.is_closed())
    }

    /// How many times a device has been opened
    #[must_use]
    pub const fn open_count(&self) -> usize {
        self.opened
    }

    /// Requested rendering rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.release();
    }
}

/// Plays decoded buffers on a shared output device
pub struct AudioPlayback {
    output: AudioOutput,
}

impl AudioPlayback {
    /// Create a playback engine at the standard rendering rate
    #[must_use]
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            output: AudioOutput::new(backend, PLAYBACK_SAMPLE_RATE),
        }
    }

    /// Create a playback engine on the default cpal host
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(CpalBackend))
    }

    /// Start playing a buffer
    ///
    /// Returns once rendering has started. The buffer is resampled when its
    /// rate differs from the device rate.
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened or rendering fails to start
    pub fn play(&mut self, buffer: DecodedAudioBuffer) -> Result<Playback> {
        if buffer.is_empty() {
            return Ok(Playback::finished());
        }

        let device = self.output.acquire()?;
        let buffer = resample(buffer, device.sample_rate())?;
        let frames = buffer.frame_count();

        let (tx, rx) = oneshot::channel();
        device.render(buffer, tx)?;

        tracing::debug!(frames, "playback started");
        Ok(Playback::new(rx))
    }

    /// Play mono samples at the rendering rate
    ///
    /// # Errors
    ///
    /// Returns error if playback fails to start
    pub fn play_samples(&mut self, samples: Vec<f32>) -> Result<Playback> {
        self.play(DecodedAudioBuffer::mono(samples, PLAYBACK_SAMPLE_RATE)?)
    }

    /// Release the output device, interrupting any playback
    pub fn release(&mut self) {
        self.output.release();
    }

    /// The device holder
    #[must_use]
    pub const fn output(&self) -> &AudioOutput {
        &self.output
    }
}

/// Output through the default cpal host
pub struct CpalBackend;

impl AudioBackend for CpalBackend {
    fn open(&self, sample_rate: u32) -> Result<Box<dyn OutputDevice>> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supports = |c: &cpal::SupportedStreamConfigRange, channels: u16| {
            c.channels() == channels
                && c.min_sample_rate() <= SampleRate(sample_rate)
                && c.max_sample_rate() >= SampleRate(sample_rate)
        };

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| supports(c, 1))
            .or_else(|| {
                // Fallback: try stereo
                device
                    .supported_output_configs()
                    .ok()?
                    .find(|c| supports(c, 2))
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(sample_rate))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Box::new(CpalDevice {
            device,
            config,
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct CpalDevice {
    device: cpal::Device,
    config: StreamConfig,
    closed: Arc<AtomicBool>,
}

impl OutputDevice for CpalDevice {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn render(&mut self, buffer: DecodedAudioBuffer, done: oneshot::Sender<()>) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Audio("output device is closed".to_string()));
        }

        let samples = buffer.interleaved(usize::from(self.config.channels));
        let timeout = buffer.duration() + Duration::from_millis(500);
        let device = self.device.clone();
        let config = self.config.clone();
        let closed = Arc::clone(&self.closed);
        let (started_tx, started_rx) = sync_channel(1);

        std::thread::Builder::new()
            .name("lingo-playback".to_string())
            .spawn(move || {
                render_blocking(&device, &config, samples, timeout, &closed, &started_tx);
                let _ = done.send(());
            })?;

        started_rx
            .recv()
            .map_err(|_| Error::Audio("playback thread exited before starting".to_string()))?
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Render interleaved samples, blocking until they finish or the device closes
fn render_blocking(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: Vec<f32>,
    timeout: Duration,
    closed: &Arc<AtomicBool>,
    started: &SyncSender<Result<()>>,
) {
    let sample_count = samples.len();
    let finished = Arc::new(AtomicBool::new(false));
    let finished_cb = Arc::clone(&finished);
    let closed_cb = Arc::clone(closed);
    let mut position = 0usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let stopped = closed_cb.load(Ordering::Relaxed);
            for out in data.iter_mut() {
                if !stopped && position < samples.len() {
                    *out = samples[position];
                    position += 1;
                } else {
                    *out = 0.0;
                    finished_cb.store(true, Ordering::Relaxed);
                }
            }
        },
        |err| {
            tracing::error!(error = %err, "audio playback error");
        },
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = started.send(Err(Error::Audio(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = started.send(Err(Error::Audio(e.to_string())));
        return;
    }
    let _ = started.send(Ok(()));

    let start = Instant::now();
    while !finished.load(Ordering::Relaxed) && !closed.load(Ordering::Relaxed) {
        if start.elapsed() > timeout {
            tracing::warn!(samples = sample_count, "playback timed out");
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    // Small delay to let the device drain
    if !closed.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100));
    }

    drop(stream);
    tracing::debug!(samples = sample_count, "playback complete");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        opened: AtomicUsize,
        rendered: Mutex<Vec<DecodedAudioBuffer>>,
    }

    struct TestBackend(Arc<Recorder>);

    struct TestDevice {
        recorder: Arc<Recorder>,
        rate: u32,
        closed: bool,
    }

    impl AudioBackend for TestBackend {
        fn open(&self, sample_rate: u32) -> Result<Box<dyn OutputDevice>> {
            self.0.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(TestDevice {
                recorder: Arc::clone(&self.0),
                rate: sample_rate,
                closed: false,
            }))
        }
    }

    impl OutputDevice for TestDevice {
        fn sample_rate(&self) -> u32 {
            self.rate
        }

        fn channels(&self) -> u16 {
            1
        }

        fn render(&mut self, buffer: DecodedAudioBuffer, done: oneshot::Sender<()>) -> Result<()> {
            self.recorder.rendered.lock().unwrap().push(buffer);
            let _ = done.send(());
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }

        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    fn engine() -> (AudioPlayback, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let playback = AudioPlayback::new(Arc::new(TestBackend(Arc::clone(&recorder))));
        (playback, recorder)
    }

    #[tokio::test]
    async fn device_is_opened_lazily_and_reused() {
        let (mut playback, recorder) = engine();
        assert!(!playback.output().is_open());
        assert_eq!(recorder.opened.load(Ordering::SeqCst), 0);

        playback.play_samples(vec![0.1; 10]).unwrap().wait().await;
        playback.play_samples(vec![0.2; 10]).unwrap().wait().await;

        assert!(playback.output().is_open());
        assert_eq!(recorder.opened.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.rendered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn device_is_reopened_after_release() {
        let (mut playback, recorder) = engine();
        playback.play_samples(vec![0.1; 4]).unwrap().wait().await;

        playback.release();
        playback.release();
        assert!(!playback.output().is_open());

        playback.play_samples(vec![0.1; 4]).unwrap().wait().await;
        assert_eq!(recorder.opened.load(Ordering::SeqCst), 2);
        assert_eq!(playback.output().open_count(), 2);
    }

    #[tokio::test]
    async fn empty_buffer_skips_device() {
        let (mut playback, recorder) = engine();
        playback.play_samples(Vec::new()).unwrap().wait().await;
        assert_eq!(recorder.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn buffers_are_resampled_to_device_rate() {
        let (mut playback, recorder) = engine();
        let buffer = DecodedAudioBuffer::mono(vec![0.0; 4800], 48000).unwrap();
        playback.play(buffer).unwrap().wait().await;

        let rendered = recorder.rendered.lock().unwrap();
        assert_eq!(rendered[0].sample_rate(), PLAYBACK_SAMPLE_RATE);
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_finished() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        Playback::new(rx).wait().await;
    }
}
