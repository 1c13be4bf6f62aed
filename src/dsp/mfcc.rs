use crate::audio::SampleBuffer;
use crate::dsp::spectrum::Stft;
use crate::error::Result;

/// Per-frame cepstral feature extraction backend
pub trait CepstralExtractor: Send + Sync {
    /// One feature vector per frame
    fn extract(&self, buffer: &SampleBuffer) -> Result<Vec<Vec<f32>>>;

    /// Hop between consecutive feature frames, in samples
    fn hop_size(&self) -> usize;
}

/// Log mel-band energies per STFT frame
///
/// Shared front end of [`MfccExtractor`] and the ONNX classifiers.
pub struct MelSpectrogram {
    stft: Stft,
    mel_bands: usize,
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

impl MelSpectrogram {
    pub fn new(frame_size: usize, hop_size: usize, mel_bands: usize) -> Self {
        Self {
            stft: Stft::new(frame_size, hop_size),
            mel_bands,
        }
    }

    pub fn mel_bands(&self) -> usize {
        self.mel_bands
    }

    pub fn hop_size(&self) -> usize {
        self.stft.hop_size()
    }

    /// Triangular filters evenly spaced on the mel scale from 0 Hz to Nyquist
    fn filterbank(&self, sample_rate: u32) -> Vec<Vec<f32>> {
        let bins = self.stft.bins();
        let nyquist = sample_rate as f64 / 2.0;
        let bin_hz = nyquist / (bins - 1).max(1) as f64;

        let max_mel = hz_to_mel(nyquist);
        let edges: Vec<f64> = (0..self.mel_bands + 2)
            .map(|i| mel_to_hz(max_mel * i as f64 / (self.mel_bands + 1) as f64))
            .collect();

        (0..self.mel_bands)
            .map(|band| {
                let (lower, center, upper) = (edges[band], edges[band + 1], edges[band + 2]);
                (0..bins)
                    .map(|bin| {
                        let hz = bin as f64 * bin_hz;
                        let weight = if hz <= lower || hz >= upper {
                            0.0
                        } else if hz <= center {
                            (hz - lower) / (center - lower)
                        } else {
                            (upper - hz) / (upper - center)
                        };
                        weight as f32
                    })
                    .collect()
            })
            .collect()
    }

    /// One row of `mel_bands` natural-log energies per frame, floored at 1e-10
    pub fn log_mel(&self, buffer: &SampleBuffer) -> Result<Vec<Vec<f32>>> {
        let filters = self.filterbank(buffer.sample_rate());
        let mut frames = Vec::with_capacity(self.stft.frame_count(buffer.len()));

        self.stft.process(buffer.samples(), |_, spectrum| {
            let power: Vec<f32> = spectrum.iter().map(|c| c.norm_sqr()).collect();
            frames.push(
                filters
                    .iter()
                    .map(|filter| {
                        let energy: f32 = filter.iter().zip(power.iter()).map(|(&w, &p)| w * p).sum();
                        energy.max(1e-10).ln()
                    })
                    .collect(),
            );
        })?;

        Ok(frames)
    }
}

/// Mel-frequency cepstral coefficients
pub struct MfccExtractor {
    mel: MelSpectrogram,
    coefficients: usize,
}

impl MfccExtractor {
    pub fn new(frame_size: usize, hop_size: usize, mel_bands: usize, coefficients: usize) -> Self {
        Self {
            mel: MelSpectrogram::new(frame_size, hop_size, mel_bands),
            coefficients,
        }
    }

    /// DCT-II of the log mel energies, keeping the first `coefficients` terms
    fn cepstrum(&self, log_energies: &[f32]) -> Vec<f32> {
        let m = log_energies.len() as f32;
        (0..self.coefficients)
            .map(|n| {
                let scale = if n == 0 { (1.0 / m).sqrt() } else { (2.0 / m).sqrt() };
                let sum: f32 = log_energies
                    .iter()
                    .enumerate()
                    .map(|(k, &e)| e * (std::f32::consts::PI * n as f32 * (k as f32 + 0.5) / m).cos())
                    .sum();
                sum * scale
            })
            .collect()
    }
}

impl CepstralExtractor for MfccExtractor {
    fn extract(&self, buffer: &SampleBuffer) -> Result<Vec<Vec<f32>>> {
        let features: Vec<Vec<f32>> = self
            .mel
            .log_mel(buffer)?
            .iter()
            .map(|log_energies| self.cepstrum(log_energies))
            .collect();

        tracing::debug!(
            "Extracted {} cepstral frames ({} coefficients)",
            features.len(),
            self.coefficients
        );
        Ok(features)
    }

    fn hop_size(&self) -> usize {
        self.mel.hop_size()
    }
}
