use std::collections::BTreeSet;

use crate::audio::SampleBuffer;
use crate::config::RhythmConfig;
use crate::dsp::{
    AdaptivePeakPicker, DetectionSeries, OnsetFunction, OnsetMethod, PeakPicker,
    SpectralOnsetFunction,
};
use crate::error::Result;

/// Merge two onset candidate lists into one timeline.
///
/// Candidates are rounded to whole milliseconds, unioned and sorted. The
/// sorted union is then scanned left to right: the first candidate is kept,
/// and each later one is kept only when it lies at least `min_gap_ms` after
/// the last kept candidate. Comparisons happen on integer milliseconds, so
/// a gap of exactly `min_gap_ms` is kept.
pub fn merge_candidates(first: &[f64], second: &[f64], min_gap_ms: u32) -> Vec<f64> {
    let union: BTreeSet<i64> = first
        .iter()
        .chain(second.iter())
        .filter(|t| t.is_finite())
        .map(|&t| (t * 1000.0).round() as i64)
        .collect();

    let min_gap = min_gap_ms as i64;
    let mut kept: Vec<i64> = Vec::with_capacity(union.len());
    for ms in union {
        match kept.last() {
            Some(&last) if ms - last < min_gap => {}
            _ => kept.push(ms),
        }
    }

    kept.into_iter().map(|ms| ms as f64 / 1000.0).collect()
}

/// Fuses a percussive and a tonal onset detection function into one onset timeline
pub struct OnsetFusionEngine {
    onset_function: Box<dyn OnsetFunction>,
    picker: Box<dyn PeakPicker>,
    min_gap_ms: u32,
}

impl OnsetFusionEngine {
    pub fn new(
        onset_function: Box<dyn OnsetFunction>,
        picker: Box<dyn PeakPicker>,
        min_gap_ms: u32,
    ) -> Self {
        Self {
            onset_function,
            picker,
            min_gap_ms,
        }
    }

    /// Engine backed by the in-crate spectral detection functions
    pub fn from_config(config: &RhythmConfig) -> Self {
        Self::new(
            Box::new(SpectralOnsetFunction::new(config.frame_size, config.hop_size)),
            Box::new(AdaptivePeakPicker::new(config.peak_threshold, config.peak_sensitivity)),
            config.min_onset_gap_ms,
        )
    }

    /// Peak-pick each stream independently and merge the candidates
    pub fn fuse_streams(&self, percussive: &DetectionSeries, tonal: &DetectionSeries) -> Vec<f64> {
        let percussive_onsets = self.picker.pick(percussive);
        let tonal_onsets = self.picker.pick(tonal);
        let fused = merge_candidates(&percussive_onsets, &tonal_onsets, self.min_gap_ms);

        tracing::debug!(
            "Fused {} percussive and {} tonal candidates into {} onsets",
            percussive_onsets.len(),
            tonal_onsets.len(),
            fused.len()
        );
        fused
    }

    /// Compute both detection functions over `buffer` and fuse them
    pub fn detect(&self, buffer: &SampleBuffer) -> Result<Vec<f64>> {
        let percussive = self.onset_function.detect(buffer, OnsetMethod::Percussive)?;
        let tonal = self.onset_function.detect(buffer, OnsetMethod::Tonal)?;
        Ok(self.fuse_streams(&percussive, &tonal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Picker that reads candidate times straight out of the series values
    struct FixedPicker;

    impl PeakPicker for FixedPicker {
        fn pick(&self, series: &DetectionSeries) -> Vec<f64> {
            series.values.iter().map(|&v| v as f64).collect()
        }
    }

    fn gaps_ms(onsets: &[f64]) -> Vec<i64> {
        onsets
            .windows(2)
            .map(|pair| ((pair[1] - pair[0]) * 1000.0).round() as i64)
            .collect()
    }

    #[test]
    fn test_empty_inputs_give_empty_timeline() {
        assert!(merge_candidates(&[], &[], 50).is_empty());
    }

    #[test]
    fn test_union_is_sorted_and_deduplicated() {
        let fused = merge_candidates(&[1.0, 0.2], &[0.2004, 0.6], 50);
        assert_eq!(fused, vec![0.2, 0.6, 1.0]);
    }

    #[test]
    fn test_greedy_gap_against_last_kept() {
        // 0.049 s apart collapses, 0.051 s apart survives
        assert_eq!(merge_candidates(&[1.0, 1.049], &[], 50), vec![1.0]);
        assert_eq!(merge_candidates(&[1.0, 1.051], &[], 50), vec![1.0, 1.051]);

        // 1.03 is dropped, so 1.06 is measured against 1.0 and kept
        assert_eq!(merge_candidates(&[1.0, 1.03], &[1.06], 50), vec![1.0, 1.06]);
    }

    #[test]
    fn test_exact_min_gap_is_kept() {
        assert_eq!(merge_candidates(&[0.1], &[0.15], 50), vec![0.1, 0.15]);
    }

    #[test]
    fn test_millisecond_rounding_merges_near_duplicates() {
        let fused = merge_candidates(&[0.5001], &[0.4996], 50);
        assert_eq!(fused, vec![0.5]);
    }

    #[test]
    fn test_fused_timeline_respects_min_gap() {
        let percussive: Vec<f64> = (0..200).map(|i| i as f64 * 0.013).collect();
        let tonal: Vec<f64> = (0..150).map(|i| 0.005 + i as f64 * 0.021).collect();
        let fused = merge_candidates(&percussive, &tonal, 50);

        assert!(!fused.is_empty());
        assert_eq!(fused[0], 0.0);
        assert!(fused.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(gaps_ms(&fused).iter().all(|&gap| gap >= 50));
    }

    #[test]
    fn test_fuse_streams_uses_picker_on_both() {
        let engine = OnsetFusionEngine::new(
            Box::new(SpectralOnsetFunction::new(1024, 512)),
            Box::new(FixedPicker),
            50,
        );
        let percussive = DetectionSeries::new(vec![0.25, 1.0], 512, 44100);
        let tonal = DetectionSeries::new(vec![0.26, 0.5], 512, 44100);

        assert_eq!(engine.fuse_streams(&percussive, &tonal), vec![0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_silence_gives_no_onsets() {
        let engine = OnsetFusionEngine::from_config(&RhythmConfig::default());
        let onsets = engine.detect(&SampleBuffer::new(vec![0.0; 44100], 44100)).unwrap();
        assert!(onsets.is_empty());

        let onsets = engine.detect(&SampleBuffer::new(vec![], 44100)).unwrap();
        assert!(onsets.is_empty());
    }
}
