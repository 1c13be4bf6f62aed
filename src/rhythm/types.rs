use serde::{Deserialize, Serialize};

/// Tempo, beats and onsets of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmResult {
    /// Tempo in beats per minute
    pub bpm: f32,

    /// Beat timestamps in seconds, increasing
    pub beats: Vec<f64>,

    /// Beat tracker confidence
    pub confidence: f32,

    /// Fused onset timeline in seconds, increasing
    pub onsets: Vec<f64>,

    /// Total duration in seconds
    pub duration: f64,
}
