use crate::audio::SampleBuffer;
use crate::config::RhythmConfig;
use crate::dsp::{BeatTracker, IntervalBeatTracker};
use crate::error::Result;
use crate::rhythm::fusion::OnsetFusionEngine;
use crate::rhythm::types::RhythmResult;

/// Packages beat tracking and fused onsets into a [`RhythmResult`]
pub struct RhythmSummarizer {
    beat_tracker: Box<dyn BeatTracker>,
    fusion: OnsetFusionEngine,
}

impl RhythmSummarizer {
    pub fn new(beat_tracker: Box<dyn BeatTracker>, fusion: OnsetFusionEngine) -> Self {
        Self { beat_tracker, fusion }
    }

    /// Summarizer backed by the in-crate tracker and detection functions
    pub fn from_config(config: &RhythmConfig) -> Self {
        Self::new(
            Box::new(IntervalBeatTracker::new(
                config.frame_size,
                config.hop_size,
                config.min_bpm,
                config.max_bpm,
            )),
            OnsetFusionEngine::from_config(config),
        )
    }

    pub fn summarize(&self, buffer: &SampleBuffer) -> Result<RhythmResult> {
        let duration = buffer.duration();
        tracing::info!(
            "Rhythm analysis of {:.1}s at {} Hz using {} tracker",
            duration,
            buffer.sample_rate(),
            self.beat_tracker.name()
        );

        let estimate = self.beat_tracker.track(buffer)?;
        let onsets = self.fusion.detect(buffer)?;

        let beats = clamp_to_duration(estimate.beats, duration);
        let onsets = clamp_to_duration(onsets, duration);

        tracing::info!(
            "Rhythm analysis complete: {:.1} BPM (confidence {:.2}), {} beats, {} onsets",
            estimate.bpm,
            estimate.confidence,
            beats.len(),
            onsets.len()
        );

        Ok(RhythmResult {
            bpm: estimate.bpm,
            beats,
            confidence: estimate.confidence,
            onsets,
            duration,
        })
    }
}

/// Drop timestamps past the end of the recording
fn clamp_to_duration(times: Vec<f64>, duration: f64) -> Vec<f64> {
    let before = times.len();
    let kept: Vec<f64> = times.into_iter().filter(|&t| t <= duration).collect();
    if kept.len() < before {
        tracing::debug!("Dropped {} timestamps past {:.3}s", before - kept.len(), duration);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{AdaptivePeakPicker, BeatEstimate, SpectralOnsetFunction};

    struct FixedTracker(BeatEstimate);

    impl BeatTracker for FixedTracker {
        fn track(&self, _buffer: &SampleBuffer) -> Result<BeatEstimate> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn click_track(sample_rate: u32, seconds: f64, interval: f64) -> SampleBuffer {
        let len = (sample_rate as f64 * seconds) as usize;
        let period = (sample_rate as f64 * interval) as usize;
        let samples = (0..len)
            .map(|i| {
                let phase = i % period;
                if phase < 400 {
                    let decay = 1.0 - phase as f32 / 400.0;
                    if i % 2 == 0 { 0.8 * decay } else { -0.8 * decay }
                } else {
                    0.0
                }
            })
            .collect();
        SampleBuffer::new(samples, sample_rate)
    }

    #[test]
    fn test_duration_from_sample_count() {
        let summarizer = RhythmSummarizer::from_config(&RhythmConfig::default());
        let result = summarizer.summarize(&SampleBuffer::new(vec![0.0; 88200], 44100)).unwrap();
        assert_eq!(result.duration, 2.0);
        assert!(result.onsets.is_empty());
    }

    #[test]
    fn test_timestamps_past_duration_are_dropped() {
        let summarizer = RhythmSummarizer::new(
            Box::new(FixedTracker(BeatEstimate {
                bpm: 100.0,
                beats: vec![0.2, 0.8, 1.4],
                confidence: 0.5,
            })),
            OnsetFusionEngine::new(
                Box::new(SpectralOnsetFunction::new(1024, 512)),
                Box::new(AdaptivePeakPicker::default()),
                50,
            ),
        );

        let result = summarizer.summarize(&SampleBuffer::new(vec![0.0; 44100], 44100)).unwrap();
        assert_eq!(result.bpm, 100.0);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.beats, vec![0.2, 0.8]);
    }

    #[test]
    fn test_click_track_rhythm() {
        let summarizer = RhythmSummarizer::from_config(&RhythmConfig::default());
        let buffer = click_track(44100, 4.0, 0.5);
        let result = summarizer.summarize(&buffer).unwrap();

        assert!(result.bpm > 0.0);
        assert!(!result.onsets.is_empty());
        assert!(result.onsets.iter().all(|&t| t >= 0.0 && t <= result.duration));
        assert!(result.beats.iter().all(|&t| t <= result.duration));
        assert!(result
            .onsets
            .windows(2)
            .all(|pair| ((pair[1] - pair[0]) * 1000.0).round() >= 50.0));
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let summarizer = RhythmSummarizer::from_config(&RhythmConfig::default());
        let buffer = click_track(44100, 3.0, 0.4);
        assert_eq!(summarizer.summarize(&buffer).unwrap(), summarizer.summarize(&buffer).unwrap());
    }
}
