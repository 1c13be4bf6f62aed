use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the music analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rhythm pipeline settings
    pub rhythm: RhythmConfig,

    /// Structural segmentation settings
    pub structure: StructureConfig,

    /// Classification settings
    pub classification: ClassificationConfig,

    /// Worker and timeout settings for the analysis engine
    pub service: ServiceConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.rhythm.validate()?;
        self.structure.validate()?;
        self.classification.validate()?;
        self.service.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Onset and beat analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    /// Sample rate audio is decoded to (Hz)
    pub sample_rate: u32,

    /// Frame size of the onset detection functions
    pub frame_size: usize,

    /// Hop size of the onset detection functions
    pub hop_size: usize,

    /// Minimum gap between two fused onsets (milliseconds)
    pub min_onset_gap_ms: u32,

    /// Floor on the normalized detection function for a peak to count
    pub peak_threshold: f32,

    /// How far above the local mean a peak must rise (0.0-1.0)
    pub peak_sensitivity: f32,

    /// Minimum BPM to detect
    pub min_bpm: f32,

    /// Maximum BPM to detect
    pub max_bpm: f32,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frame_size: 1024,
            hop_size: 512,
            min_onset_gap_ms: 50,
            peak_threshold: 0.1,
            peak_sensitivity: 0.7,
            min_bpm: 60.0,
            max_bpm: 200.0,
        }
    }
}

impl RhythmConfig {
    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("rhythm.sample_rate", self.sample_rate).into());
        }

        if self.frame_size == 0 || !self.frame_size.is_power_of_two() {
            return Err(invalid("rhythm.frame_size", self.frame_size).into());
        }

        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(invalid("rhythm.hop_size", self.hop_size).into());
        }

        if !(0.0..=1.0).contains(&self.peak_threshold) {
            return Err(invalid("rhythm.peak_threshold", self.peak_threshold).into());
        }

        if !(0.0..=1.0).contains(&self.peak_sensitivity) {
            return Err(invalid("rhythm.peak_sensitivity", self.peak_sensitivity).into());
        }

        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(invalid(
                "rhythm.bpm_range",
                format!("{}-{}", self.min_bpm, self.max_bpm),
            ).into());
        }

        Ok(())
    }
}

/// Structural segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Frame size of the cepstral features
    pub frame_size: usize,

    /// Hop size of the cepstral features; also converts boundary frames to seconds
    pub hop_size: usize,

    /// Number of cepstral coefficients per frame
    pub mfcc_coefficients: usize,

    /// Number of mel bands feeding the cepstrum
    pub mel_bands: usize,

    /// Minimum distance between two change points (frames)
    pub min_separation_frames: usize,

    /// Weight of the model-complexity penalty in the change-point criterion
    pub penalty_weight: f64,

    /// Mean squared amplitude above which an interior section is a chorus
    pub chorus_energy_threshold: f64,

    /// Fraction of the track at each end where position decides the label
    pub edge_fraction: f64,

    /// Fewest boundaries (including 0 and the end) that get segmented
    pub min_boundaries: usize,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 1024,
            mfcc_coefficients: 13,
            mel_bands: 40,
            min_separation_frames: 100,
            penalty_weight: 1.5,
            chorus_energy_threshold: 0.04,
            edge_fraction: 0.1,
            min_boundaries: 4,
        }
    }
}

impl StructureConfig {
    fn validate(&self) -> Result<()> {
        if self.frame_size == 0 || !self.frame_size.is_power_of_two() {
            return Err(invalid("structure.frame_size", self.frame_size).into());
        }

        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(invalid("structure.hop_size", self.hop_size).into());
        }

        if self.mfcc_coefficients == 0 || self.mfcc_coefficients > self.mel_bands {
            return Err(invalid(
                "structure.mfcc_coefficients",
                format!("{} (mel_bands = {})", self.mfcc_coefficients, self.mel_bands),
            ).into());
        }

        if self.min_separation_frames == 0 {
            return Err(invalid("structure.min_separation_frames", self.min_separation_frames).into());
        }

        if !(0.0..0.5).contains(&self.edge_fraction) {
            return Err(invalid("structure.edge_fraction", self.edge_fraction).into());
        }

        if self.min_boundaries < 2 {
            return Err(invalid("structure.min_boundaries", self.min_boundaries).into());
        }

        Ok(())
    }
}

/// Classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Sample rate the models expect (Hz)
    pub sample_rate: u32,

    /// Number of genre candidates kept in the score map
    pub top_k: usize,

    /// Mean activation a tag must strictly exceed
    pub tag_threshold: f32,

    /// Width of the embedding fed to the mood regression model
    pub embedding_dim: usize,

    /// Largest absolute mood output still treated as a 0-1 scale
    pub normalized_range_limit: f32,

    /// Directory holding `genre`, `tags` and `mood` as `<name>.onnx` plus `<name>.json` metadata
    pub model_dir: Option<PathBuf>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            top_k: 5,
            tag_threshold: 0.15,
            embedding_dim: 200,
            normalized_range_limit: 1.5,
            model_dir: None,
        }
    }
}

impl ClassificationConfig {
    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("classification.sample_rate", self.sample_rate).into());
        }

        if self.top_k == 0 {
            return Err(invalid("classification.top_k", self.top_k).into());
        }

        if self.embedding_dim == 0 {
            return Err(invalid("classification.embedding_dim", self.embedding_dim).into());
        }

        if self.normalized_range_limit <= 0.0 {
            return Err(invalid(
                "classification.normalized_range_limit",
                self.normalized_range_limit,
            ).into());
        }

        Ok(())
    }
}

/// Analysis engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Upper bound on a single analysis request (seconds)
    pub timeout_secs: u64,

    /// Number of worker threads for the async runtime
    pub worker_threads: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            worker_threads: num_cpus::get(),
        }
    }
}

impl ServiceConfig {
    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(invalid("service.timeout_secs", self.timeout_secs).into());
        }

        if self.worker_threads == 0 {
            return Err(invalid("service.worker_threads", self.worker_threads).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.classification.model_dir = Some(dir.path().to_path_buf());

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.rhythm.hop_size, loaded_config.rhythm.hop_size);
        assert_eq!(
            original_config.structure.min_separation_frames,
            loaded_config.structure.min_separation_frames
        );
        assert_eq!(
            original_config.classification.model_dir,
            loaded_config.classification.model_dir
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[rhythm]\nmin_onset_gap_ms = 80\n").unwrap();
        assert_eq!(config.rhythm.min_onset_gap_ms, 80);
        assert_eq!(config.rhythm.hop_size, 512);
        assert_eq!(config.structure.hop_size, 1024);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::error::AnalyzerError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_bpm_range() {
        let mut config = Config::default();
        config.rhythm.min_bpm = 150.0;
        config.rhythm.max_bpm = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_structure_config() {
        let mut config = Config::default();
        config.structure.mfcc_coefficients = 64;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.structure.edge_fraction = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_service_config() {
        let mut config = Config::default();
        config.service.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
