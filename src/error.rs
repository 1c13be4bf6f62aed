use thiserror::Error;

/// Main error type for the music-analyzer library
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Analysis timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Analysis worker failed: {reason}")]
    Worker { reason: String },
}

/// Audio input and signal-processing errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Inference model errors
///
/// None of these fail a classification call on their own; the aggregator
/// degrades the affected stage instead.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model unavailable: {name}")]
    Unavailable { name: String },

    #[error("Model {name} produced {got} values, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Model {name} does not support {operation}")]
    Unsupported { name: String, operation: String },

    #[error("Inference failed in {name}: {reason}")]
    InferenceFailed { name: String, reason: String },

    #[error("Failed to load model file {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using AnalyzerError
pub type Result<T> = std::result::Result<T, AnalyzerError>;

impl AnalyzerError {
    /// Whether the caller handed us audio we cannot read.
    ///
    /// Input errors are reported as-is and never retried.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Audio(AudioError::LoadFailed { .. })
                | Self::Audio(AudioError::UnsupportedFormat { .. })
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!("Could not decode audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Audio(AudioError::UnsupportedFormat { format }) => {
                format!("Audio format '{}' is not supported. Supported formats: wav, mp3, flac, ogg, m4a, aac", format)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Timeout { seconds } => {
                format!("Analysis did not finish within {} seconds.", seconds)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        let err: AnalyzerError = AudioError::LoadFailed { path: "a.wav".to_string() }.into();
        assert!(err.is_input_error());

        let err: AnalyzerError = AudioError::UnsupportedFormat { format: "xyz".to_string() }.into();
        assert!(err.is_input_error());

        let err: AnalyzerError = ModelError::Unavailable { name: "genre".to_string() }.into();
        assert!(!err.is_input_error());

        assert!(!AnalyzerError::Timeout { seconds: 5 }.is_input_error());
    }

    #[test]
    fn test_user_messages() {
        let err: AnalyzerError = AudioError::UnsupportedFormat { format: "xyz".to_string() }.into();
        assert!(err.user_message().contains("'xyz'"));

        let err = AnalyzerError::Timeout { seconds: 30 };
        assert!(err.user_message().contains("30 seconds"));

        let err = AnalyzerError::Worker { reason: "boom".to_string() };
        assert_eq!(err.user_message(), "Analysis worker failed: boom");
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = ModelError::DimensionMismatch {
            name: "genre".to_string(),
            expected: 10,
            got: 7,
        };
        assert_eq!(err.to_string(), "Model genre produced 7 values, expected 10");
    }
}
