use rubato::{FftFixedInOut, Resampler as RubatoResampler};
use tracing::debug;

use crate::audio::types::SampleBuffer;
use crate::error::{AudioError, Result};

/// Sample-rate conversion backend
pub trait Resampler: Send + Sync {
    /// Convert `buffer` to `target_rate`, returning a new buffer
    fn resample(&self, buffer: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer>;

    /// Get the name of this resampler (for logging)
    fn name(&self) -> &'static str;
}

fn check_rates(buffer: &SampleBuffer, target_rate: u32) -> Result<()> {
    if target_rate == 0 || buffer.sample_rate() == 0 {
        return Err(AudioError::InvalidParameters {
            details: format!(
                "cannot resample from {} Hz to {} Hz",
                buffer.sample_rate(),
                target_rate
            ),
        }.into());
    }
    Ok(())
}

/// Band-limited FFT resampler on top of `rubato`
///
/// Low-passes below the lower Nyquist frequency, so content above the target
/// band is removed instead of folding back into it. Falls back to
/// [`LinearResampler`] when rubato cannot be set up for the rate pair.
#[derive(Debug, Clone, Copy)]
pub struct FftResampler {
    chunk_size: usize,
}

impl FftResampler {
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;

    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }
}

impl Default for FftResampler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE)
    }
}

impl Resampler for FftResampler {
    fn resample(&self, buffer: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
        check_rates(buffer, target_rate)?;

        let from_rate = buffer.sample_rate();
        if from_rate == target_rate || buffer.is_empty() {
            return Ok(SampleBuffer::new(buffer.samples().to_vec(), target_rate));
        }

        let mut resampler = match FftFixedInOut::<f32>::new(
            from_rate as usize,
            target_rate as usize,
            self.chunk_size,
            1,
        ) {
            Ok(resampler) => resampler,
            Err(e) => {
                debug!("FFT resampler init failed ({}), using linear interpolation", e);
                return LinearResampler.resample(buffer, target_rate);
            }
        };

        let input = buffer.samples();
        let expected = (input.len() as u64 * target_rate as u64 / from_rate as u64) as usize;
        let delay = resampler.output_delay();

        // Keep feeding (zero-padded) chunks until the delayed tail is flushed
        let mut output = Vec::with_capacity(expected + delay + resampler.output_frames_max());
        let mut chunk = Vec::with_capacity(resampler.input_frames_max());
        let mut pos = 0;
        while output.len() < expected + delay {
            let needed = resampler.input_frames_next();
            let end = (pos + needed).min(input.len());
            chunk.clear();
            chunk.extend_from_slice(&input[pos..end]);
            chunk.resize(needed, 0.0);
            pos = end;

            let processed = resampler
                .process(&[chunk.as_slice()], None)
                .map_err(|e| AudioError::AnalysisFailed {
                    reason: format!("resampling {} Hz to {} Hz failed: {}", from_rate, target_rate, e),
                })?;
            match processed.first() {
                Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
                _ => {
                    return Err(AudioError::AnalysisFailed {
                        reason: "resampler produced no output".to_string(),
                    }.into())
                }
            }
        }

        output.drain(..delay);
        output.truncate(expected);

        debug!(
            "Resampled {} samples at {} Hz to {} samples at {} Hz",
            input.len(),
            from_rate,
            output.len(),
            target_rate
        );

        Ok(SampleBuffer::new(output, target_rate))
    }

    fn name(&self) -> &'static str {
        "fft"
    }
}

/// Linear-interpolation resampler
///
/// Does not low-pass before decimating; only used when the FFT resampler
/// cannot handle a rate pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample(&self, buffer: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
        check_rates(buffer, target_rate)?;

        if buffer.sample_rate() == target_rate || buffer.is_empty() {
            return Ok(SampleBuffer::new(buffer.samples().to_vec(), target_rate));
        }

        let input = buffer.samples();
        let ratio = buffer.sample_rate() as f64 / target_rate as f64;
        let output_len = ((input.len() as f64) / ratio).floor() as usize;
        let last = input.len() - 1;

        let output = (0..output_len)
            .map(|i| {
                let position = i as f64 * ratio;
                let index = position.floor() as usize;
                let frac = (position - index as f64) as f32;
                let a = input[index.min(last)];
                let b = input[(index + 1).min(last)];
                a + (b - a) * frac
            })
            .collect();

        debug!(
            "Linearly resampled {} samples at {} Hz to {} samples at {} Hz",
            input.len(),
            buffer.sample_rate(),
            output_len,
            target_rate
        );

        Ok(SampleBuffer::new(output, target_rate))
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let buffer = SampleBuffer::new(vec![0.1, 0.2, 0.3], 16000);
        let out = LinearResampler.resample(&buffer, 16000).unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_downsample_preserves_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 44100], 44100);
        let out = LinearResampler.resample(&buffer, 16000).unwrap();
        assert_eq!(out.sample_rate(), 16000);
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn test_upsample_interpolates() {
        let buffer = SampleBuffer::new(vec![0.0, 1.0, 0.0, 1.0], 2);
        let out = LinearResampler.resample(&buffer, 4).unwrap();
        assert_eq!(out.samples()[..4], [0.0, 0.5, 1.0, 0.5]);
    }

    #[test]
    fn test_zero_rate_rejected() {
        let buffer = SampleBuffer::new(vec![0.0; 4], 44100);
        assert!(LinearResampler.resample(&buffer, 0).is_err());
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = SampleBuffer::new(vec![], 44100);
        let out = LinearResampler.resample(&buffer, 16000).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate(), 16000);
    }

    fn sine(freq: f32, rate: u32, seconds: usize) -> SampleBuffer {
        let samples = (0..rate as usize * seconds)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect();
        SampleBuffer::new(samples, rate)
    }

    /// RMS of the buffer, ignoring the first and last 100 ms
    fn inner_rms(buffer: &SampleBuffer) -> f32 {
        let edge = buffer.sample_rate() as usize / 10;
        let inner = &buffer.samples()[edge..buffer.len() - edge];
        (inner.iter().map(|x| x * x).sum::<f32>() / inner.len() as f32).sqrt()
    }

    #[test]
    fn test_fft_removes_content_above_target_nyquist() {
        // 12 kHz cannot be represented at 16 kHz and must not alias down to 4 kHz
        let out = FftResampler::default().resample(&sine(12_000.0, 44100, 1), 16000).unwrap();
        assert_eq!(out.sample_rate(), 16000);
        assert_eq!(out.len(), 16000);
        assert!(inner_rms(&out) < 0.1, "rms {}", inner_rms(&out));
    }

    #[test]
    fn test_fft_keeps_in_band_tone() {
        let out = FftResampler::default().resample(&sine(440.0, 44100, 1), 16000).unwrap();
        assert_eq!(out.len(), 16000);
        assert!((inner_rms(&out) - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.05);
    }

    #[test]
    fn test_fft_upsample_length() {
        let out = FftResampler::default().resample(&sine(440.0, 16000, 2), 44100).unwrap();
        assert_eq!(out.len(), 88200);
    }

    #[test]
    fn test_fft_passthrough_and_errors() {
        let buffer = SampleBuffer::new(vec![0.1, 0.2, 0.3], 16000);
        assert_eq!(FftResampler::default().resample(&buffer, 16000).unwrap(), buffer);
        assert!(FftResampler::default().resample(&buffer, 0).is_err());

        let empty = FftResampler::default().resample(&SampleBuffer::new(vec![], 44100), 16000).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.sample_rate(), 16000);
    }
}
