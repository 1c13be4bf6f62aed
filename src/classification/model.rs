use std::path::Path;

use serde::Deserialize;

use crate::audio::SampleBuffer;
use crate::error::{ModelError, Result};

/// Per-frame model outputs; every row has the same width
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivationMatrix {
    frames: Vec<Vec<f32>>,
}

impl ActivationMatrix {
    /// Wrap per-frame rows, rejecting ragged input
    pub fn from_frames(name: &str, frames: Vec<Vec<f32>>) -> Result<Self> {
        if let Some(first) = frames.first() {
            let width = first.len();
            if let Some(row) = frames.iter().find(|row| row.len() != width) {
                return Err(ModelError::DimensionMismatch {
                    name: name.to_string(),
                    expected: width,
                    got: row.len(),
                }.into());
            }
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Values per frame, 0 when there are no frames
    pub fn width(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    /// Average over the frame axis; empty when there are no frames
    pub fn mean(&self) -> Vec<f32> {
        let width = self.width();
        if self.frames.is_empty() {
            return Vec::new();
        }

        let mut sums = vec![0.0f64; width];
        for row in &self.frames {
            for (sum, &value) in sums.iter_mut().zip(row.iter()) {
                *sum += value as f64;
            }
        }

        let count = self.frames.len() as f64;
        sums.into_iter().map(|sum| (sum / count) as f32).collect()
    }
}

/// Ordered class names a model's outputs are addressed by
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LabelVocabulary {
    classes: Vec<String>,
}

impl LabelVocabulary {
    pub fn new<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the `classes` array of a model metadata JSON file
    pub fn from_metadata_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_failed = |reason: String| ModelError::LoadFailed {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let vocabulary: LabelVocabulary =
            serde_json::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// What a model is run on
#[derive(Debug, Clone, Copy)]
pub enum ModelInput<'a> {
    /// 16 kHz mono audio
    Audio(&'a SampleBuffer),

    /// A single embedding vector produced by another model
    Embedding(&'a [f32]),
}

/// Pretrained inference backend
pub trait InferenceModel: Send + Sync {
    /// Returns the name of this model (for logging and errors)
    fn name(&self) -> &str;

    /// Class names addressing the model's output columns
    fn labels(&self) -> &LabelVocabulary;

    /// Run the model and return per-frame activations
    fn infer(&self, input: ModelInput<'_>) -> Result<ActivationMatrix>;

    /// Per-frame embeddings of `buffer`
    ///
    /// Only models with an embedding layer support this.
    fn embeddings(&self, buffer: &SampleBuffer) -> Result<ActivationMatrix> {
        let _ = buffer;
        Err(ModelError::Unsupported {
            name: self.name().to_string(),
            operation: "embeddings".to_string(),
        }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use tempfile::tempdir;

    #[test]
    fn test_mean_over_frames() {
        let matrix = ActivationMatrix::from_frames(
            "m",
            vec![vec![0.0, 1.0, 0.5], vec![1.0, 0.0, 0.5]],
        ).unwrap();
        assert_eq!(matrix.mean(), vec![0.5, 0.5, 0.5]);
        assert_eq!(matrix.width(), 3);
        assert_eq!(matrix.frame_count(), 2);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = ActivationMatrix::from_frames("m", vec![]).unwrap();
        assert!(matrix.mean().is_empty());
        assert_eq!(matrix.width(), 0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = ActivationMatrix::from_frames("m", vec![vec![0.0, 1.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(AnalyzerError::Model(ModelError::DimensionMismatch { expected: 2, got: 1, .. }))
        ));
    }

    #[test]
    fn test_vocabulary_from_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genre.json");
        std::fs::write(&path, r#"{"name": "genre", "classes": ["rock", "jazz"], "version": 1}"#).unwrap();

        let vocabulary = LabelVocabulary::from_metadata_file(&path).unwrap();
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.get(1), Some("jazz"));
        assert_eq!(vocabulary.get(2), None);
    }

    #[test]
    fn test_vocabulary_missing_file() {
        let result = LabelVocabulary::from_metadata_file("/no/such/labels.json");
        assert!(matches!(result, Err(AnalyzerError::Model(ModelError::LoadFailed { .. }))));
    }
}
