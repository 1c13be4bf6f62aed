use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::audio::SampleBuffer;
use crate::dsp::spectrum::Stft;
use crate::error::Result;

/// Which onset detection function to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnsetMethod {
    /// High-frequency content; reacts to drum hits and other broadband attacks
    Percussive,

    /// Complex-domain deviation; reacts to pitch and phase changes
    Tonal,

    /// Positive spectral flux
    Flux,
}

impl OnsetMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percussive => "percussive",
            Self::Tonal => "tonal",
            Self::Flux => "flux",
        }
    }
}

/// Per-frame onset detection values plus the framing needed to place them in time
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSeries {
    pub values: Vec<f32>,
    pub hop_size: usize,
    pub sample_rate: u32,
}

impl DetectionSeries {
    pub fn new(values: Vec<f32>, hop_size: usize, sample_rate: u32) -> Self {
        Self { values, hop_size, sample_rate }
    }

    /// Empty series, as produced by silence or a zero-length buffer
    pub fn empty(hop_size: usize, sample_rate: u32) -> Self {
        Self::new(Vec::new(), hop_size, sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time in seconds of frame `index`
    pub fn frame_time(&self, index: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (index * self.hop_size) as f64 / self.sample_rate as f64
    }
}

/// Spectral onset detection backend
pub trait OnsetFunction: Send + Sync {
    /// Compute the detection function of `method` over the whole buffer
    fn detect(&self, buffer: &SampleBuffer, method: OnsetMethod) -> Result<DetectionSeries>;

    /// Get the name of this backend (for logging)
    fn name(&self) -> &'static str;
}

/// FFT-based onset detection functions
pub struct SpectralOnsetFunction {
    stft: Stft,
}

impl SpectralOnsetFunction {
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        Self {
            stft: Stft::new(frame_size, hop_size),
        }
    }

    /// Sum of bin-weighted power; high bins dominate
    fn high_frequency_content(magnitude: &[f32]) -> f32 {
        magnitude
            .iter()
            .enumerate()
            .map(|(k, &m)| k as f32 * m * m)
            .sum()
    }

    fn positive_flux(current: &[f32], previous: &[f32]) -> f32 {
        current
            .iter()
            .zip(previous.iter())
            .map(|(&curr, &prev)| (curr - prev).max(0.0))
            .sum()
    }
}

impl OnsetFunction for SpectralOnsetFunction {
    fn detect(&self, buffer: &SampleBuffer, method: OnsetMethod) -> Result<DetectionSeries> {
        let hop_size = self.stft.hop_size();
        let sample_rate = buffer.sample_rate();

        if buffer.is_empty() {
            return Ok(DetectionSeries::empty(hop_size, sample_rate));
        }

        let bins = self.stft.bins();
        let mut values = Vec::with_capacity(self.stft.frame_count(buffer.len()));

        // Magnitude and phase of the two previous frames
        let mut prev_magnitude = vec![0.0f32; bins];
        let mut prev_phase = vec![0.0f32; bins];
        let mut prev_prev_phase = vec![0.0f32; bins];

        self.stft.process(buffer.samples(), |_, spectrum| {
            let magnitude: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();

            let value = match method {
                OnsetMethod::Percussive => Self::high_frequency_content(&magnitude),
                OnsetMethod::Flux => Self::positive_flux(&magnitude, &prev_magnitude),
                OnsetMethod::Tonal => spectrum
                    .iter()
                    .enumerate()
                    .map(|(k, bin)| {
                        // Steady state predicts the previous magnitude with a
                        // linearly advancing phase.
                        let target_phase = 2.0 * prev_phase[k] - prev_prev_phase[k];
                        let predicted = Complex::from_polar(prev_magnitude[k], target_phase);
                        (*bin - predicted).norm()
                    })
                    .sum(),
            };
            values.push(value);

            prev_prev_phase.copy_from_slice(&prev_phase);
            for (slot, bin) in prev_phase.iter_mut().zip(spectrum.iter()) {
                *slot = bin.arg();
            }
            prev_magnitude.copy_from_slice(&magnitude);
        })?;

        tracing::debug!(
            "{} detection function: {} frames, max {:.3}",
            method.as_str(),
            values.len(),
            values.iter().copied().fold(0.0f32, f32::max)
        );

        Ok(DetectionSeries::new(values, hop_size, sample_rate))
    }

    fn name(&self) -> &'static str {
        "spectral"
    }
}
