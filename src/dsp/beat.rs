use std::collections::BTreeMap;

use crate::audio::SampleBuffer;
use crate::dsp::onset::{OnsetFunction, OnsetMethod, SpectralOnsetFunction};
use crate::dsp::peaks::{AdaptivePeakPicker, PeakPicker};
use crate::error::Result;

/// Tempo, beat positions and tracker confidence
#[derive(Debug, Clone, PartialEq)]
pub struct BeatEstimate {
    pub bpm: f32,
    pub beats: Vec<f64>,
    pub confidence: f32,
}

/// Tempo and beat estimation backend
pub trait BeatTracker: Send + Sync {
    fn track(&self, buffer: &SampleBuffer) -> Result<BeatEstimate>;

    /// Get the name of this tracker (for logging)
    fn name(&self) -> &'static str;
}

const FALLBACK_BPM: f32 = 120.0;
const FALLBACK_CONFIDENCE: f32 = 0.1;

/// Beat tracker built on spectral-flux onsets and an inter-onset interval histogram
pub struct IntervalBeatTracker {
    onset_function: SpectralOnsetFunction,
    picker: AdaptivePeakPicker,
    min_bpm: f32,
    max_bpm: f32,
}

impl IntervalBeatTracker {
    pub fn new(frame_size: usize, hop_size: usize, min_bpm: f32, max_bpm: f32) -> Self {
        Self {
            onset_function: SpectralOnsetFunction::new(frame_size, hop_size),
            picker: AdaptivePeakPicker::default(),
            min_bpm,
            max_bpm,
        }
    }

    /// Drop onsets closer together than the fastest allowed beat
    fn filter_beats(&self, onsets: &[f64]) -> Vec<f64> {
        let min_beat_interval = 60.0 / self.max_bpm as f64;
        let mut beats: Vec<f64> = Vec::new();

        for &onset_time in onsets {
            match beats.last() {
                Some(&last) if onset_time - last < min_beat_interval => {}
                _ => beats.push(onset_time),
            }
        }
        beats
    }

    /// Most common inter-beat interval, quantized to 1 ms
    fn estimate_tempo(&self, beats: &[f64]) -> (f32, f32) {
        if beats.len() < 2 {
            return (FALLBACK_BPM, FALLBACK_CONFIDENCE);
        }

        let intervals: Vec<f64> = beats
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|&interval| {
                let bpm = 60.0 / interval;
                bpm >= self.min_bpm as f64 && bpm <= self.max_bpm as f64
            })
            .collect();

        if intervals.is_empty() {
            return (FALLBACK_BPM, FALLBACK_CONFIDENCE);
        }

        let mut interval_counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &interval in &intervals {
            *interval_counts.entry((interval * 1000.0).round() as i64).or_insert(0) += 1;
        }

        // Highest count wins; the shortest interval breaks ties
        let most_common_ms = interval_counts
            .iter()
            .fold((500i64, 0usize), |best, (&ms, &count)| {
                if count > best.1 { (ms, count) } else { best }
            })
            .0;
        let most_common_interval = most_common_ms as f64 / 1000.0;

        let matching = intervals
            .iter()
            .filter(|&&interval| (interval - most_common_interval).abs() < 0.05)
            .count();
        let confidence = (matching as f32 / intervals.len() as f32).min(1.0);

        ((60.0 / most_common_interval) as f32, confidence)
    }
}

impl BeatTracker for IntervalBeatTracker {
    fn track(&self, buffer: &SampleBuffer) -> Result<BeatEstimate> {
        let series = self.onset_function.detect(buffer, OnsetMethod::Flux)?;
        let onsets = self.picker.pick(&series);
        let beats = self.filter_beats(&onsets);
        let (bpm, confidence) = self.estimate_tempo(&beats);

        tracing::debug!(
            "Tempo estimation: {:.1} BPM (confidence: {:.2}) from {} beats",
            bpm, confidence, beats.len()
        );

        Ok(BeatEstimate { bpm, beats, confidence })
    }

    fn name(&self) -> &'static str {
        "interval-histogram"
    }
}
