use std::collections::BTreeMap;

use crate::audio::{FftResampler, Resampler, SampleBuffer};
use crate::classification::model::{InferenceModel, ModelInput};
use crate::classification::types::{ClassificationResult, ClassificationScore, MoodEstimate};
use crate::config::ClassificationConfig;
use crate::error::{ModelError, Result};

/// Optional genre, tag and mood models
///
/// The tag model doubles as the embedding source for mood estimation.
#[derive(Default)]
pub struct ClassifierModels {
    pub genre: Option<Box<dyn InferenceModel>>,
    pub tags: Option<Box<dyn InferenceModel>>,
    pub mood: Option<Box<dyn InferenceModel>>,
}

impl ClassifierModels {
    /// No models at all; every stage reports its placeholder
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    pub fn any(&self) -> bool {
        self.genre.is_some() || self.tags.is_some() || self.mood.is_some()
    }
}

/// Indices of the `k` highest scores, best first; ties keep index order
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    indices.truncate(k);
    indices
}

/// Indices whose score is strictly above `threshold`, ascending
pub fn tags_above(scores: &[f32], threshold: f32) -> Vec<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Midpoint of the regression's output scale
///
/// Outputs whose magnitude stays within `normalized_limit` are taken to be
/// on a `[0, 1]` scale (center 0.5), anything larger on the 1-9 scale
/// (center 5.0).
pub fn calibration_center(valence: f32, arousal: f32, normalized_limit: f32) -> f32 {
    if valence.abs().max(arousal.abs()) <= normalized_limit {
        0.5
    } else {
        5.0
    }
}

/// Turns per-frame model activations into genre, tag and mood results
///
/// Each stage runs independently: a missing model or a failing stage
/// yields that stage's placeholder and leaves the others untouched.
pub struct ClassificationAggregator {
    models: ClassifierModels,
    resampler: Box<dyn Resampler>,
    sample_rate: u32,
    top_k: usize,
    tag_threshold: f32,
    embedding_dim: usize,
    normalized_range_limit: f32,
}

impl ClassificationAggregator {
    pub fn new(models: ClassifierModels, config: &ClassificationConfig) -> Self {
        Self {
            models,
            resampler: Box::new(FftResampler::default()),
            sample_rate: config.sample_rate,
            top_k: config.top_k,
            tag_threshold: config.tag_threshold,
            embedding_dim: config.embedding_dim,
            normalized_range_limit: config.normalized_range_limit,
        }
    }

    /// Replace the resampler used for non-16 kHz input
    pub fn with_resampler(mut self, resampler: Box<dyn Resampler>) -> Self {
        self.resampler = resampler;
        self
    }

    pub fn models(&self) -> &ClassifierModels {
        &self.models
    }

    /// Classify `buffer`, resampling it to the model rate first if needed
    pub fn classify(&self, buffer: &SampleBuffer) -> Result<ClassificationResult> {
        let resampled;
        let buffer = if buffer.sample_rate() == self.sample_rate {
            buffer
        } else {
            tracing::debug!(
                "Resampling {} Hz -> {} Hz with {}",
                buffer.sample_rate(),
                self.sample_rate,
                self.resampler.name()
            );
            resampled = self.resampler.resample(buffer, self.sample_rate)?;
            &resampled
        };

        tracing::info!("Classifying {:.1}s of audio", buffer.duration());

        let genres = match &self.models.genre {
            Some(model) => self.classify_genre(model.as_ref(), buffer).unwrap_or_else(|e| {
                tracing::warn!("Genre classification failed: {}", e);
                ClassificationScore::unknown()
            }),
            None => ClassificationScore::unknown(),
        };

        let tags = match &self.models.tags {
            Some(model) => self.detect_tags(model.as_ref(), buffer).unwrap_or_else(|e| {
                tracing::warn!("Tag detection failed: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let mood_estimate = match (&self.models.tags, &self.models.mood) {
            (Some(embedder), Some(regressor)) => {
                match self.estimate_mood(embedder.as_ref(), regressor.as_ref(), buffer) {
                    Ok(estimate) => Some(estimate),
                    Err(e) => {
                        tracing::warn!("Mood estimation failed: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };
        let moods = mood_estimate
            .as_ref()
            .map_or_else(ClassificationScore::unknown, MoodEstimate::to_score);

        tracing::info!(
            "Classification: genre {} ({:.2}), mood {}, {} tags",
            genres.label,
            genres.confidence,
            moods.label,
            tags.len()
        );

        Ok(ClassificationResult {
            genres,
            moods,
            tags,
            mood_estimate,
        })
    }

    /// Top-1 genre and the top-k score map
    ///
    /// A mean vector whose width differs from the vocabulary gives the
    /// dimension-mismatch sentinel instead of an error.
    pub fn classify_genre(
        &self,
        model: &dyn InferenceModel,
        buffer: &SampleBuffer,
    ) -> Result<ClassificationScore> {
        let mean = model.infer(ModelInput::Audio(buffer))?.mean();
        let labels = model.labels();

        if mean.len() != labels.len() {
            tracing::warn!(
                "Model {} produced {} scores for {} labels",
                model.name(),
                mean.len(),
                labels.len()
            );
            return Ok(ClassificationScore::dimension_mismatch());
        }

        let ranked = top_k(&mean, self.top_k);
        let Some(&best) = ranked.first() else {
            return Ok(ClassificationScore::unknown());
        };

        let all_scores: BTreeMap<String, f32> = ranked
            .iter()
            .filter_map(|&i| labels.get(i).map(|label| (label.to_string(), mean[i])))
            .collect();

        Ok(ClassificationScore {
            label: labels.get(best).unwrap_or_default().to_string(),
            confidence: mean[best],
            all_scores,
        })
    }

    /// Labels whose mean activation exceeds the tag threshold, in vocabulary order
    pub fn detect_tags(&self, model: &dyn InferenceModel, buffer: &SampleBuffer) -> Result<Vec<String>> {
        let mean = model.infer(ModelInput::Audio(buffer))?.mean();
        let labels = model.labels();

        if mean.len() != labels.len() {
            return Err(ModelError::DimensionMismatch {
                name: model.name().to_string(),
                expected: labels.len(),
                got: mean.len(),
            }.into());
        }

        let mut tags: Vec<String> = Vec::new();
        for index in tags_above(&mean, self.tag_threshold) {
            if let Some(label) = labels.get(index) {
                if !tags.iter().any(|t| t == label) {
                    tags.push(label.to_string());
                }
            }
        }
        Ok(tags)
    }

    /// Valence/arousal from the mean embedding, with its calibrated quadrant
    ///
    /// The regression's first output column is valence, the second arousal.
    pub fn estimate_mood(
        &self,
        embedder: &dyn InferenceModel,
        regressor: &dyn InferenceModel,
        buffer: &SampleBuffer,
    ) -> Result<MoodEstimate> {
        let embedding = embedder.embeddings(buffer)?.mean();
        if embedding.len() != self.embedding_dim {
            return Err(ModelError::DimensionMismatch {
                name: embedder.name().to_string(),
                expected: self.embedding_dim,
                got: embedding.len(),
            }.into());
        }

        let output = regressor.infer(ModelInput::Embedding(&embedding))?.mean();
        let (valence, arousal) = match output.as_slice() {
            [valence, arousal] => (*valence, *arousal),
            _ => {
                return Err(ModelError::DimensionMismatch {
                    name: regressor.name().to_string(),
                    expected: 2,
                    got: output.len(),
                }.into())
            }
        };

        let center = calibration_center(valence, arousal, self.normalized_range_limit);
        tracing::debug!(
            "Mood: valence {:.3}, arousal {:.3}, center {}",
            valence,
            arousal,
            center
        );
        Ok(MoodEstimate::new(valence, arousal, center))
    }
}
