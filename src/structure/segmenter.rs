use crate::audio::SampleBuffer;
use crate::config::StructureConfig;
use crate::dsp::{BicChangePointDetector, CepstralExtractor, ChangePointDetector, MfccExtractor};
use crate::error::Result;
use crate::structure::types::{LabelDecision, Section, SectionLabel, StructureResult};

/// Convert change-point frame indices into a full boundary list in seconds.
///
/// The result starts with 0.0, ends with `duration`, and holds the sorted
/// frame times in between, clamped into `[0, duration]`.
pub fn boundaries_from_frames(
    frames: &[usize],
    hop_size: usize,
    sample_rate: u32,
    duration: f64,
) -> Vec<f64> {
    let mut interior: Vec<f64> = frames
        .iter()
        .map(|&f| (f * hop_size) as f64 / sample_rate as f64)
        .map(|t| t.clamp(0.0, duration.max(0.0)))
        .collect();
    interior.sort_by(f64::total_cmp);

    let mut boundaries = Vec::with_capacity(interior.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(interior);
    boundaries.push(duration);
    boundaries
}

/// Splits a recording into labeled sections
///
/// Boundary detection is delegated to a [`ChangePointDetector`] over
/// cepstral features; this type turns the detected frames into sections and
/// labels them. Labels come from a priority-ordered rule: a section whose
/// midpoint sits in the leading or trailing `edge_fraction` of the track is
/// `intro`/`outro` regardless of loudness, every other section is `chorus`
/// or `verse` depending on its mean squared amplitude.
pub struct StructureSegmenter {
    extractor: Box<dyn CepstralExtractor>,
    detector: Box<dyn ChangePointDetector>,
    min_separation_frames: usize,
    chorus_energy_threshold: f64,
    edge_fraction: f64,
    min_boundaries: usize,
}

impl StructureSegmenter {
    pub fn new(
        extractor: Box<dyn CepstralExtractor>,
        detector: Box<dyn ChangePointDetector>,
        config: &StructureConfig,
    ) -> Self {
        Self {
            extractor,
            detector,
            min_separation_frames: config.min_separation_frames,
            chorus_energy_threshold: config.chorus_energy_threshold,
            edge_fraction: config.edge_fraction,
            min_boundaries: config.min_boundaries,
        }
    }

    /// Segmenter backed by MFCC features and BIC change points
    pub fn from_config(config: &StructureConfig) -> Self {
        Self::new(
            Box::new(MfccExtractor::new(
                config.frame_size,
                config.hop_size,
                config.mel_bands,
                config.mfcc_coefficients,
            )),
            Box::new(BicChangePointDetector::new(config.penalty_weight)),
            config,
        )
    }

    /// Extract features from `buffer` and segment it
    pub fn segment(&self, buffer: &SampleBuffer) -> Result<StructureResult> {
        tracing::info!("Structural segmentation of {:.1}s of audio", buffer.duration());
        let features = self.extractor.extract(buffer)?;
        Ok(self.segment_with_features(buffer, &features, self.extractor.hop_size()))
    }

    /// Segment `buffer` using precomputed per-frame features
    pub fn segment_with_features(
        &self,
        buffer: &SampleBuffer,
        features: &[Vec<f32>],
        hop_size: usize,
    ) -> StructureResult {
        let frames = self.detector.detect(features, self.min_separation_frames);
        self.sections_from_frames(buffer, &frames, hop_size)
    }

    /// Build the result from change-point frame indices
    pub fn sections_from_frames(
        &self,
        buffer: &SampleBuffer,
        frames: &[usize],
        hop_size: usize,
    ) -> StructureResult {
        let duration = buffer.duration();
        let boundaries = boundaries_from_frames(frames, hop_size, buffer.sample_rate(), duration);

        if boundaries.len() < self.min_boundaries || duration <= 0.0 {
            tracing::debug!(
                "{} boundaries for {:.1}s of audio, using a single full-length section",
                boundaries.len(),
                duration
            );
            return StructureResult {
                sections: vec![Section::new(0.0, duration, SectionLabel::Full)],
                boundaries,
            };
        }

        let sections: Vec<Section> = boundaries
            .windows(2)
            .map(|pair| {
                let decision = self.decide_label(buffer, pair[0], pair[1], duration);
                Section::new(pair[0], pair[1], decision.label())
            })
            .collect();

        tracing::info!(
            "Segmented into {} sections: {}",
            sections.len(),
            sections.iter().map(|s| s.label.as_str()).collect::<Vec<_>>().join(", ")
        );

        StructureResult { sections, boundaries }
    }

    /// Label the section `[start, end)` of a track lasting `duration` seconds
    pub fn decide_label(
        &self,
        buffer: &SampleBuffer,
        start: f64,
        end: f64,
        duration: f64,
    ) -> LabelDecision {
        let position = ((start + end) / 2.0) / duration;
        if let Some(label) = self.positional_label(position) {
            return LabelDecision::Positional(label);
        }

        let energy = SampleBuffer::mean_energy(buffer.slice_seconds(start, end));
        LabelDecision::Energy {
            label: self.energy_label(energy),
            energy,
        }
    }

    /// `intro`/`outro` for a relative midpoint in the track's edges, else nothing
    pub fn positional_label(&self, position: f64) -> Option<SectionLabel> {
        if position < self.edge_fraction {
            Some(SectionLabel::Intro)
        } else if position > 1.0 - self.edge_fraction {
            Some(SectionLabel::Outro)
        } else {
            None
        }
    }

    pub fn energy_label(&self, energy: f64) -> SectionLabel {
        if energy > self.chorus_energy_threshold {
            SectionLabel::Chorus
        } else {
            SectionLabel::Verse
        }
    }
}
