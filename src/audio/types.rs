/// Mono audio samples at a known sample rate
///
/// Produced once by the loader (or a resampler) and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Audio samples, mono
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples covering `[start, end)` seconds, clamped to the buffer.
    ///
    /// Inverted or out-of-range intervals give an empty slice.
    pub fn slice_seconds(&self, start: f64, end: f64) -> &[f32] {
        let rate = self.sample_rate as f64;
        let start_idx = ((start.max(0.0) * rate) as usize).min(self.samples.len());
        let end_idx = ((end.max(0.0) * rate) as usize).min(self.samples.len());

        if end_idx <= start_idx {
            return &[];
        }
        &self.samples[start_idx..end_idx]
    }

    /// Mean squared amplitude of a sample slice, 0 for an empty slice
    ///
    /// Accumulates in f64; an f32 sum drifts by several percent over a few
    /// million samples.
    pub fn mean_energy(samples: &[f32]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|&x| x as f64 * x as f64).sum::<f64>() / samples.len() as f64
    }
}

/// Mix interleaved multi-channel samples down to mono
pub fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_mixdown() {
        let stereo_samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // L, R, L, R, L, R
        assert_eq!(mix_to_mono(&stereo_samples, 2), vec![1.5, 3.5, 5.5]);
        assert_eq!(mix_to_mono(&stereo_samples, 1), stereo_samples);
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 22050], 44100);
        assert_eq!(buffer.duration(), 0.5);
        assert_eq!(SampleBuffer::new(vec![], 44100).duration(), 0.0);
        assert_eq!(SampleBuffer::new(vec![0.0; 10], 0).duration(), 0.0);
    }

    #[test]
    fn test_slice_seconds() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let buffer = SampleBuffer::new(samples, 10);

        assert_eq!(buffer.slice_seconds(1.0, 2.0), &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0]);
        assert_eq!(buffer.slice_seconds(9.5, 20.0).len(), 5);
        assert!(buffer.slice_seconds(3.0, 3.0).is_empty());
        assert!(buffer.slice_seconds(5.0, 4.0).is_empty());
        assert!(buffer.slice_seconds(20.0, 30.0).is_empty());
    }

    #[test]
    fn test_mean_energy() {
        assert_eq!(SampleBuffer::mean_energy(&[]), 0.0);
        assert_eq!(SampleBuffer::mean_energy(&[0.5, -0.5]), 0.25);
    }

    #[test]
    fn test_mean_energy_long_slice() {
        // 48 s at 44.1 kHz
        let samples = vec![0.2025f32; 44100 * 48];
        let expected = 0.2025f32 as f64 * 0.2025f32 as f64;
        assert!((SampleBuffer::mean_energy(&samples) - expected).abs() < 1e-9);
    }
}
