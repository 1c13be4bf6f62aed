//! # Classification Module
//!
//! Genre, tag and mood classification from pretrained models. Models sit
//! behind the [`InferenceModel`] trait and are created through a
//! [`ModelRegistry`]; with the `onnx` feature (on by default) the built-in
//! entries run ONNX networks through ONNX Runtime.
//!
//! ## Example
//!
//! ```rust,no_run
//! use music_analyzer::classification::{ClassificationAggregator, ModelRegistry};
//! use music_analyzer::config::ClassificationConfig;
//! use music_analyzer::audio::SampleBuffer;
//!
//! let config = ClassificationConfig {
//!     model_dir: Some("models".into()),
//!     ..ClassificationConfig::default()
//! };
//! let models = ModelRegistry::new().load_models(&config);
//! let aggregator = ClassificationAggregator::new(models, &config);
//!
//! let buffer = SampleBuffer::new(vec![0.0; 16000], 16000);
//! let result = aggregator.classify(&buffer)?;
//! println!("{} / {}", result.genres.label, result.moods.label);
//! # Ok::<(), music_analyzer::AnalyzerError>(())
//! ```

pub mod aggregator;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod registry;
pub mod types;

pub use aggregator::{calibration_center, tags_above, top_k, ClassificationAggregator, ClassifierModels};
pub use model::{ActivationMatrix, InferenceModel, LabelVocabulary, ModelInput};
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
pub use registry::{ModelRegistry, GENRE_MODEL, MOOD_MODEL, TAG_MODEL};
pub use types::{ClassificationResult, ClassificationScore, MoodEstimate, MoodQuadrant};
