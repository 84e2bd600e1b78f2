//! 16-bit linear PCM decoding and buffer utilities

use crate::{Error, Result};

/// Divisor mapping an `i16` onto [-1.0, 1.0)
const I16_SCALE: f32 = 32768.0;

/// Decoded, normalized multi-channel audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl DecodedAudioBuffer {
    /// Build a buffer from per-channel sample vectors
    ///
    /// # Errors
    ///
    /// Returns error if there are no channels, the rate is zero, or the
    /// channels differ in length
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let frames = channels.first().map(Vec::len);
        let consistent = channels.iter().all(|c| Some(c.len()) == frames);
        if channels.is_empty() || sample_rate == 0 || !consistent {
            return Err(Error::InvalidAudioParameters {
                sample_rate: i64::from(sample_rate),
                channels: i64::try_from(channels.len()).unwrap_or(i64::MAX),
            });
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Build a mono buffer
    ///
    /// # Errors
    ///
    /// Returns error if the sample rate is zero
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![samples], sample_rate)
    }

    /// Number of frames (samples per channel)
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Number of channels
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples of one channel
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// True if the buffer holds no frames
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Playback duration
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Interleave samples for a device with `out_channels` channels
    ///
    /// Mono is duplicated onto every output channel, a multi-channel buffer
    /// rendered on a mono device is averaged, and other mismatches wrap
    /// channel indices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn interleaved(&self, out_channels: usize) -> Vec<f32> {
        let out_channels = out_channels.max(1);
        let src = self.channel_count();
        let mut out = Vec::with_capacity(self.frame_count() * out_channels);

        for frame in 0..self.frame_count() {
            if out_channels == 1 && src > 1 {
                let sum: f32 = self.channels.iter().map(|c| c[frame]).sum();
                out.push(sum / src as f32);
                continue;
            }
            for ch in 0..out_channels {
                out.push(self.channels[ch % src][frame]);
            }
        }

        out
    }
}

/// Decode interleaved signed 16-bit little-endian PCM
///
/// Trailing bytes that do not form a whole frame are dropped. Samples are
/// divided by 32768, so -32768 maps to exactly -1.0 and 32767 to just under 1.0.
///
/// # Errors
///
/// Returns `InvalidAudioParameters` if `sample_rate` or `channel_count` is not positive
pub fn decode_pcm(bytes: &[u8], sample_rate: i32, channel_count: i32) -> Result<DecodedAudioBuffer> {
    let (Ok(rate), Ok(channels)) = (u32::try_from(sample_rate), usize::try_from(channel_count))
    else {
        return Err(invalid(sample_rate, channel_count));
    };
    if rate == 0 || channels == 0 {
        return Err(invalid(sample_rate, channel_count));
    }

    let frame_count = bytes.len() / 2 / channels;
    let mut out = vec![Vec::with_capacity(frame_count); channels];

    for frame in bytes.chunks_exact(2 * channels).take(frame_count) {
        for (ch, sample) in frame.chunks_exact(2).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            out[ch].push(f32::from(value) / I16_SCALE);
        }
    }

    Ok(DecodedAudioBuffer {
        channels: out,
        sample_rate: rate,
    })
}

fn invalid(sample_rate: i32, channel_count: i32) -> Error {
    Error::InvalidAudioParameters {
        sample_rate: i64::from(sample_rate),
        channels: i64::from(channel_count),
    }
}

/// Resample a buffer to `target_rate` using rubato
///
/// Returns the buffer unchanged when the rates already match.
///
/// # Errors
///
/// Returns error if the resampler cannot be built or fails
#[allow(clippy::cast_possible_truncation)]
pub fn resample(buffer: DecodedAudioBuffer, target_rate: u32) -> Result<DecodedAudioBuffer> {
    use rubato::{FftFixedIn, Resampler};

    if buffer.sample_rate == target_rate {
        return Ok(buffer);
    }
    if buffer.is_empty() {
        return Ok(DecodedAudioBuffer {
            sample_rate: target_rate,
            ..buffer
        });
    }

    let chunk_size = 1024;
    let sub_chunks = 2;
    let channel_count = buffer.channel_count();

    let mut resampler = FftFixedIn::<f64>::new(
        buffer.sample_rate as usize,
        target_rate as usize,
        chunk_size,
        sub_chunks,
        channel_count,
    )
    .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let input: Vec<Vec<f64>> = buffer
        .channels
        .iter()
        .map(|c| c.iter().map(|&s| f64::from(s)).collect())
        .collect();

    let mut output: Vec<Vec<f64>> = vec![Vec::new(); channel_count];
    let mut start = 0;
    while start < buffer.frame_count() {
        let end = (start + chunk_size).min(buffer.frame_count());
        let chunk: Vec<&[f64]> = input.iter().map(|c| &c[start..end]).collect();
        let result = if end - start == chunk_size {
            resampler.process(&chunk, None)
        } else {
            resampler.process_partial(Some(chunk.as_slice()), None)
        }
        .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;

        for (dst, src) in output.iter_mut().zip(result) {
            dst.extend(src);
        }
        start = end;
    }

    let channels = output
        .into_iter()
        .map(|c| c.into_iter().map(|s| s as f32).collect())
        .collect();
    DecodedAudioBuffer::from_channels(channels, target_rate)
}

/// Encode a buffer as 16-bit WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(buffer: &DecodedAudioBuffer) -> Result<Vec<u8>> {
    let channels =
        u16::try_from(buffer.channel_count()).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = hound::WavSpec {
        channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for sample in buffer.interleaved(buffer.channel_count()) {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * I16_SCALE).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
