use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::{
    analysis::types::FullAnalysis,
    audio::AudioLoader,
    classification::{ClassificationAggregator, ClassificationResult, ModelRegistry},
    config::Config,
    error::{AnalyzerError, Result},
    rhythm::{RhythmResult, RhythmSummarizer},
    structure::{StructureResult, StructureSegmenter},
};

/// Runs the analysis pipelines on audio files
///
/// Every request follows the same steps:
/// 1. Decode - Load the file as mono audio at the analysis rate
/// 2. Analyze - Run the requested pipelines on a blocking worker thread
/// 3. Deadline - Give up once the configured timeout has passed
///
/// Pipelines are shared behind `Arc`, so one engine can serve concurrent
/// requests.
pub struct AnalysisEngine {
    config: Config,
    rhythm: Arc<RhythmSummarizer>,
    structure: Arc<StructureSegmenter>,
    classifier: Arc<ClassificationAggregator>,
}

impl AnalysisEngine {
    /// Build the default pipelines; models are loaded from `classification.model_dir`
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, &ModelRegistry::new())
    }

    /// Build the default pipelines with models from `registry`
    pub fn with_registry(config: Config, registry: &ModelRegistry) -> Result<Self> {
        config.validate()?;

        debug!("Registered model backends: {:?}", registry.available_models());
        let models = registry.load_models(&config.classification);
        info!(
            "Classification models: genre {}, tags {}, mood {}",
            availability(models.genre.is_some()),
            availability(models.tags.is_some()),
            availability(models.mood.is_some())
        );

        Ok(Self {
            rhythm: Arc::new(RhythmSummarizer::from_config(&config.rhythm)),
            structure: Arc::new(StructureSegmenter::from_config(&config.structure)),
            classifier: Arc::new(ClassificationAggregator::new(models, &config.classification)),
            config,
        })
    }

    /// Assemble an engine from prebuilt pipelines
    pub fn with_pipelines(
        config: Config,
        rhythm: RhythmSummarizer,
        structure: StructureSegmenter,
        classifier: ClassificationAggregator,
    ) -> Self {
        Self {
            config,
            rhythm: Arc::new(rhythm),
            structure: Arc::new(structure),
            classifier: Arc::new(classifier),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether any classification model is loaded
    pub fn has_classifier(&self) -> bool {
        self.classifier.models().any()
    }

    /// Tempo, beats and onsets of the file at `path`
    pub async fn analyze_rhythm<P: AsRef<Path>>(&self, path: P) -> Result<RhythmResult> {
        let path = path.as_ref().to_path_buf();
        info!("🥁 Rhythm analysis: {:?}", path);

        let rate = self.config.rhythm.sample_rate;
        let rhythm = Arc::clone(&self.rhythm);
        self.run_blocking(move || {
            let buffer = AudioLoader::load(&path, rate)?;
            rhythm.summarize(&buffer)
        })
        .await
    }

    /// Labeled sections of the file at `path`
    pub async fn analyze_structure<P: AsRef<Path>>(&self, path: P) -> Result<StructureResult> {
        let path = path.as_ref().to_path_buf();
        info!("🧱 Structure analysis: {:?}", path);

        let rate = self.config.rhythm.sample_rate;
        let structure = Arc::clone(&self.structure);
        self.run_blocking(move || {
            let buffer = AudioLoader::load(&path, rate)?;
            let result = structure.segment(&buffer)?;
            if result.is_fallback() {
                debug!("Too few boundaries, reporting the whole track as one section");
            }
            Ok(result)
        })
        .await
    }

    /// Genre, mood and tags of the file at `path`
    ///
    /// Stages without a model report placeholders.
    pub async fn classify<P: AsRef<Path>>(&self, path: P) -> Result<ClassificationResult> {
        let path = path.as_ref().to_path_buf();
        info!("🏷️ Classification: {:?}", path);

        let rate = self.config.classification.sample_rate;
        let classifier = Arc::clone(&self.classifier);
        self.run_blocking(move || {
            let buffer = AudioLoader::load(&path, rate)?;
            classifier.classify(&buffer)
        })
        .await
    }

    /// Rhythm and structure, plus classification when a model is loaded
    pub async fn analyze_full<P: AsRef<Path>>(&self, path: P) -> Result<FullAnalysis> {
        let path: PathBuf = path.as_ref().to_path_buf();
        info!("🎵 Full analysis: {:?}", path);

        let rate = self.config.rhythm.sample_rate;
        let rhythm = Arc::clone(&self.rhythm);
        let structure = Arc::clone(&self.structure);
        let classifier = Arc::clone(&self.classifier);

        self.run_blocking(move || {
            let buffer = AudioLoader::load(&path, rate)?;

            let (rhythm, structure) = rayon::join(
                || rhythm.summarize(&buffer),
                || structure.segment(&buffer),
            );

            let classification = if classifier.models().any() {
                Some(classifier.classify(&buffer)?)
            } else {
                debug!("No classification models loaded, skipping classification");
                None
            };

            Ok(FullAnalysis {
                rhythm: rhythm?,
                structure: structure?,
                classification,
            })
        })
        .await
    }

    /// Run `job` on the blocking pool under the configured timeout
    async fn run_blocking<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let seconds = self.config.service.timeout_secs;
        let task = tokio::task::spawn_blocking(job);

        match tokio::time::timeout(Duration::from_secs(seconds), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(AnalyzerError::Worker {
                reason: e.to_string(),
            }),
            Err(_) => Err(AnalyzerError::Timeout { seconds }),
        }
    }
}

fn availability(loaded: bool) -> &'static str {
    if loaded {
        "loaded"
    } else {
        "unavailable"
    }
}
