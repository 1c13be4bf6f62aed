//! ONNX Runtime inference backend.
//!
//! A model named `genre` lives in two files inside the model directory:
//! `genre.onnx` with the network and `genre.json` with its metadata:
//!
//! ```json
//! {
//!   "classes": ["blues", "classical", "rock"],
//!   "input": "audio",
//!   "features": { "frame_size": 512, "hop_size": 256, "mel_bands": 96, "patch_frames": 187 },
//!   "embedding_output": 1
//! }
//! ```
//!
//! Audio-input models receive log-mel patches shaped
//! `[1, patch_frames, mel_bands]`, one run per patch. Embedding-input models
//! receive a single `[1, dim]` vector. Output rows become activation frames.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array2, Array3};
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tracing::{debug, info};

use crate::audio::SampleBuffer;
use crate::classification::model::{ActivationMatrix, InferenceModel, LabelVocabulary, ModelInput};
use crate::dsp::MelSpectrogram;
use crate::error::{AnalyzerError, ModelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Audio,
    Embedding,
}

/// Log-mel front end of audio-input models
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub frame_size: usize,
    pub hop_size: usize,
    pub mel_bands: usize,
    pub patch_frames: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            frame_size: 512,
            hop_size: 256,
            mel_bands: 96,
            patch_frames: 187,
        }
    }
}

/// Everything in `<name>.json` except the class list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub input: InputKind,

    #[serde(default)]
    pub features: FeatureSettings,

    /// Index of the output holding per-patch embeddings, if any
    #[serde(default)]
    pub embedding_output: Option<usize>,
}

impl ModelMetadata {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_failed = |reason: String| ModelError::LoadFailed {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let metadata: ModelMetadata =
            serde_json::from_str(&content).map_err(|e| load_failed(e.to_string()))?;

        let features = &metadata.features;
        if features.frame_size == 0 || features.hop_size == 0 || features.mel_bands == 0 || features.patch_frames == 0 {
            return Err(load_failed(format!("invalid feature settings {:?}", features)).into());
        }
        Ok(metadata)
    }
}

/// Cut log-mel frames into non-overlapping `patch_frames`-long patches,
/// each flattened frame by frame.
///
/// A trailing partial patch is dropped unless it is the only one, in which
/// case it is padded with copies of the silence floor so short clips still
/// produce one patch.
pub fn mel_patches(frames: &[Vec<f32>], patch_frames: usize, mel_bands: usize) -> Vec<Vec<f32>> {
    if frames.is_empty() || patch_frames == 0 {
        return Vec::new();
    }

    let floor = 1e-10f32.ln();
    let full = frames.len() / patch_frames;
    let count = full.max(1);

    (0..count)
        .map(|p| {
            let mut patch = Vec::with_capacity(patch_frames * mel_bands);
            for i in 0..patch_frames {
                match frames.get(p * patch_frames + i) {
                    Some(frame) => patch.extend_from_slice(frame),
                    None => patch.extend(std::iter::repeat(floor).take(mel_bands)),
                }
            }
            patch
        })
        .collect()
}

/// Split a flat output tensor into rows of its last dimension
fn split_rows(shape: &[i64], data: &[f32]) -> Option<Vec<Vec<f32>>> {
    let width = *shape.last()?;
    if width <= 0 || data.len() % width as usize != 0 {
        return None;
    }
    Some(data.chunks(width as usize).map(<[f32]>::to_vec).collect())
}

/// Pretrained network run through ONNX Runtime
pub struct OnnxModel {
    name: String,
    labels: LabelVocabulary,
    metadata: ModelMetadata,
    mel: MelSpectrogram,
    // Session::run needs exclusive access
    session: Mutex<Session>,
}

impl OnnxModel {
    /// Load `<name>.onnx` and `<name>.json` from `dir`
    ///
    /// A missing network file means the model is unavailable.
    pub fn load<P: AsRef<Path>>(dir: P, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let model_path = dir.join(format!("{}.onnx", name));
        let metadata_path = dir.join(format!("{}.json", name));

        if !model_path.exists() {
            return Err(ModelError::Unavailable {
                name: name.to_string(),
            }.into());
        }

        let labels = LabelVocabulary::from_metadata_file(&metadata_path)?;
        let metadata = ModelMetadata::from_file(&metadata_path)?;

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(&model_path))
            .map_err(|e| ModelError::LoadFailed {
                path: model_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let features = &metadata.features;
        let mel = MelSpectrogram::new(features.frame_size, features.hop_size, features.mel_bands);

        info!(
            "Loaded model {} from {:?} ({} classes, {:?} input)",
            name,
            model_path,
            labels.len(),
            metadata.input
        );

        Ok(Self {
            name: name.to_string(),
            labels,
            metadata,
            mel,
            session: Mutex::new(session),
        })
    }

    fn failed(&self, reason: impl std::fmt::Display) -> AnalyzerError {
        ModelError::InferenceFailed {
            name: self.name.clone(),
            reason: reason.to_string(),
        }.into()
    }

    fn unsupported(&self, operation: &str) -> AnalyzerError {
        ModelError::Unsupported {
            name: self.name.clone(),
            operation: operation.to_string(),
        }.into()
    }

    /// Run one input tensor and return the rows of output `output`
    fn run(&self, input: Tensor<f32>, output: usize) -> Result<Vec<Vec<f32>>> {
        let mut session = self.session.lock().map_err(|_| self.failed("session lock poisoned"))?;

        let input_name = session
            .inputs
            .first()
            .map(|info| info.name.clone())
            .ok_or_else(|| self.failed("model declares no inputs"))?;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input])
            .map_err(|e| self.failed(e))?;

        let (_, value) = outputs
            .iter()
            .nth(output)
            .ok_or_else(|| self.failed(format!("model has no output #{}", output)))?;

        let (shape, data) = value.try_extract_tensor::<f32>().map_err(|e| self.failed(e))?;
        let shape: Vec<i64> = shape.iter().copied().collect();

        split_rows(&shape, data).ok_or_else(|| self.failed(format!("unexpected output shape {:?}", shape)))
    }

    /// Run every log-mel patch of `buffer` and stack the rows of output `output`
    fn run_patches(&self, buffer: &SampleBuffer, output: usize) -> Result<Vec<Vec<f32>>> {
        if self.metadata.input != InputKind::Audio {
            return Err(self.unsupported("audio input"));
        }

        let features = &self.metadata.features;
        let frames = self.mel.log_mel(buffer)?;
        let patches = mel_patches(&frames, features.patch_frames, features.mel_bands);
        if patches.is_empty() {
            return Err(self.failed("audio too short for one patch"));
        }

        debug!("{}: running {} patches ({} mel frames)", self.name, patches.len(), frames.len());

        let mut rows = Vec::new();
        for patch in patches {
            let input = Array3::from_shape_vec((1, features.patch_frames, features.mel_bands), patch)
                .map_err(|e| self.failed(e))?;
            let tensor = Tensor::from_array(input).map_err(|e| self.failed(e))?;
            rows.extend(self.run(tensor, output)?);
        }
        Ok(rows)
    }
}

impl InferenceModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &LabelVocabulary {
        &self.labels
    }

    fn infer(&self, input: ModelInput<'_>) -> Result<ActivationMatrix> {
        let rows = match input {
            ModelInput::Audio(buffer) => self.run_patches(buffer, 0)?,
            ModelInput::Embedding(embedding) => {
                if self.metadata.input != InputKind::Embedding {
                    return Err(self.unsupported("embedding input"));
                }
                let input = Array2::from_shape_vec((1, embedding.len()), embedding.to_vec())
                    .map_err(|e| self.failed(e))?;
                let tensor = Tensor::from_array(input).map_err(|e| self.failed(e))?;
                self.run(tensor, 0)?
            }
        };
        ActivationMatrix::from_frames(&self.name, rows)
    }

    fn embeddings(&self, buffer: &SampleBuffer) -> Result<ActivationMatrix> {
        let output = self
            .metadata
            .embedding_output
            .ok_or_else(|| self.unsupported("embeddings"))?;
        let rows = self.run_patches(buffer, output)?;
        ActivationMatrix::from_frames(&self.name, rows)
    }
}
