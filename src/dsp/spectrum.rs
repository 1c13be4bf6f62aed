use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::error::{AudioError, Result};

/// Hann-windowed short-time Fourier transform over a mono signal
///
/// Frame `i` starts at sample `i * hop_size`; frames running past the end of
/// the signal are zero-padded, so any non-empty signal yields at least one
/// frame.
pub struct Stft {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
}

impl Stft {
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let window = (0..frame_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (frame_size - 1).max(1) as f32).cos())
            })
            .collect();

        Self {
            frame_size,
            hop_size: hop_size.max(1),
            window,
            fft,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of spectrum bins per frame
    pub fn bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    pub fn frame_count(&self, signal_len: usize) -> usize {
        if signal_len == 0 {
            return 0;
        }
        (signal_len + self.hop_size - 1) / self.hop_size
    }

    /// Run the transform, handing each frame's complex spectrum to `visit`
    pub fn process<F>(&self, samples: &[f32], mut visit: F) -> Result<()>
    where
        F: FnMut(usize, &[Complex<f32>]),
    {
        let mut input = self.fft.make_input_vec();
        let mut spectrum = self.fft.make_output_vec();

        for frame_idx in 0..self.frame_count(samples.len()) {
            let start = frame_idx * self.hop_size;
            let end = (start + self.frame_size).min(samples.len());
            let frame = &samples[start..end];

            for (i, slot) in input.iter_mut().enumerate() {
                *slot = frame.get(i).copied().unwrap_or(0.0) * self.window[i];
            }

            self.fft.process(&mut input, &mut spectrum)
                .map_err(|e| AudioError::AnalysisFailed {
                    reason: format!("FFT processing failed: {}", e)
                })?;

            visit(frame_idx, &spectrum);
        }

        Ok(())
    }

    /// Magnitude spectra for every frame
    pub fn magnitudes(&self, samples: &[f32]) -> Result<Vec<Vec<f32>>> {
        let mut frames = Vec::with_capacity(self.frame_count(samples.len()));
        self.process(samples, |_, spectrum| {
            frames.push(spectrum.iter().map(|c| c.norm()).collect());
        })?;
        Ok(frames)
    }
}
