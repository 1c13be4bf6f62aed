use std::collections::HashMap;
use std::path::Path;

use crate::classification::aggregator::ClassifierModels;
use crate::classification::model::InferenceModel;
#[cfg(feature = "onnx")]
use crate::classification::onnx::OnnxModel;
use crate::config::ClassificationConfig;
use crate::error::{AnalyzerError, ModelError, Result};

/// Genre classifier
pub const GENRE_MODEL: &str = "genre";

/// Tag classifier, also the source of mood embeddings
pub const TAG_MODEL: &str = "tags";

/// Valence/arousal regression over embeddings
pub const MOOD_MODEL: &str = "mood";

type ModelFactory =
    Box<dyn Fn(&ClassificationConfig) -> Result<Box<dyn InferenceModel>> + Send + Sync>;

/// Registry of inference model backends
///
/// Models are registered by name and instantiated on demand from the
/// classification config. The built-in entries load ONNX networks named
/// `<name>.onnx`, with a `<name>.json` metadata file, from `model_dir`.
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
}

impl ModelRegistry {
    /// Create a registry with the built-in models
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };

        registry.register_builtin_models();
        registry
    }

    fn register_builtin_models(&mut self) {
        for name in [GENRE_MODEL, TAG_MODEL, MOOD_MODEL] {
            self.register(name.to_string(), move |config| {
                let dir = config.model_dir.as_ref().ok_or_else(|| ModelError::Unavailable {
                    name: name.to_string(),
                })?;
                load_builtin(dir, name)
            });
        }
    }

    /// Register a model factory, replacing any existing entry of that name
    pub fn register<F>(&mut self, name: String, factory: F)
    where
        F: Fn(&ClassificationConfig) -> Result<Box<dyn InferenceModel>> + Send + Sync + 'static,
    {
        self.factories.insert(name, Box::new(factory));
    }

    /// Instantiate the model registered as `name`
    pub fn create(&self, name: &str, config: &ClassificationConfig) -> Result<Box<dyn InferenceModel>> {
        let factory = self.factories.get(name).ok_or_else(|| ModelError::Unavailable {
            name: name.to_string(),
        })?;
        factory(config)
    }

    /// Registered model names, sorted
    pub fn available_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate the genre, tag and mood models
    ///
    /// A model that cannot be created is left out; its classification
    /// stage then reports a placeholder.
    pub fn load_models(&self, config: &ClassificationConfig) -> ClassifierModels {
        ClassifierModels {
            genre: self.try_create(GENRE_MODEL, config),
            tags: self.try_create(TAG_MODEL, config),
            mood: self.try_create(MOOD_MODEL, config),
        }
    }

    fn try_create(&self, name: &str, config: &ClassificationConfig) -> Option<Box<dyn InferenceModel>> {
        match self.create(name, config) {
            Ok(model) => Some(model),
            Err(AnalyzerError::Model(ModelError::Unavailable { .. })) => {
                tracing::debug!("Model {} is not available", name);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to load model {}: {}", name, e);
                None
            }
        }
    }
}

#[cfg(feature = "onnx")]
fn load_builtin(dir: &Path, name: &str) -> Result<Box<dyn InferenceModel>> {
    Ok(Box::new(OnnxModel::load(dir, name)?))
}

#[cfg(not(feature = "onnx"))]
fn load_builtin(_dir: &Path, name: &str) -> Result<Box<dyn InferenceModel>> {
    tracing::debug!("Built without the onnx feature, model {} is unavailable", name);
    Err(ModelError::Unavailable {
        name: name.to_string(),
    }.into())
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::model::{ActivationMatrix, LabelVocabulary, ModelInput};
    use tempfile::tempdir;

    struct ConstantModel {
        labels: LabelVocabulary,
    }

    impl InferenceModel for ConstantModel {
        fn name(&self) -> &str {
            "constant"
        }

        fn labels(&self) -> &LabelVocabulary {
            &self.labels
        }

        fn infer(&self, _input: ModelInput<'_>) -> Result<ActivationMatrix> {
            ActivationMatrix::from_frames("constant", vec![vec![1.0]])
        }
    }

    #[test]
    fn test_builtin_models_registered() {
        let registry = ModelRegistry::new();
        assert!(registry.has_model(GENRE_MODEL));
        assert!(registry.has_model(TAG_MODEL));
        assert!(registry.has_model(MOOD_MODEL));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.available_models(), vec!["genre", "mood", "tags"]);
    }

    #[test]
    fn test_no_model_dir_means_no_models() {
        let registry = ModelRegistry::new();
        let models = registry.load_models(&ClassificationConfig::default());
        assert!(models.is_empty());
    }

    #[test]
    fn test_unknown_model() {
        let registry = ModelRegistry::new();
        let result = registry.create("nope", &ClassificationConfig::default());
        assert!(matches!(result, Err(AnalyzerError::Model(ModelError::Unavailable { .. }))));
    }

    #[test]
    fn test_broken_or_missing_files_leave_stages_empty() {
        let dir = tempdir().unwrap();
        // Metadata without a network, and a network that does not parse
        std::fs::write(dir.path().join("genre.json"), r#"{ "classes": ["rock"] }"#).unwrap();
        std::fs::write(dir.path().join("tags.onnx"), b"not a network").unwrap();
        std::fs::write(dir.path().join("tags.json"), r#"{ "classes": ["guitar"] }"#).unwrap();

        let config = ClassificationConfig {
            model_dir: Some(dir.path().to_path_buf()),
            ..ClassificationConfig::default()
        };
        let registry = ModelRegistry::new();

        assert!(matches!(
            registry.create(GENRE_MODEL, &config),
            Err(AnalyzerError::Model(ModelError::Unavailable { .. }))
        ));
        assert!(registry.create(TAG_MODEL, &config).is_err());
        assert!(registry.load_models(&config).is_empty());
    }

    #[test]
    fn test_registered_backend_fills_its_stage() {
        let mut registry = ModelRegistry::new();
        registry.register(GENRE_MODEL.to_string(), |_| {
            Ok(Box::new(ConstantModel { labels: LabelVocabulary::new(["rock"]) }) as Box<dyn InferenceModel>)
        });

        let models = registry.load_models(&ClassificationConfig::default());
        assert!(models.genre.is_some());
        assert!(models.tags.is_none());
        assert!(models.mood.is_none());
        assert!(models.any());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = ModelRegistry::new();
        registry.register(GENRE_MODEL.to_string(), |_| {
            Ok(Box::new(ConstantModel { labels: LabelVocabulary::new(["only"]) }) as Box<dyn InferenceModel>)
        });

        assert_eq!(registry.len(), 3);
        let model = registry.create(GENRE_MODEL, &ClassificationConfig::default()).unwrap();
        assert_eq!(model.name(), "constant");
    }
}
