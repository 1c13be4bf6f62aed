use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label reported when no model result is available
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Label reported when a model's output width disagrees with its vocabulary
pub const DIMENSION_MISMATCH_LABEL: &str = "Error: dimension mismatch";

/// Top label of a classifier plus the scores of the retained candidates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScore {
    pub label: String,
    pub confidence: f32,
    pub all_scores: BTreeMap<String, f32>,
}

impl ClassificationScore {
    /// Placeholder for a stage that produced nothing
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            all_scores: BTreeMap::new(),
        }
    }

    /// Sentinel for a model whose output width disagrees with its vocabulary
    pub fn dimension_mismatch() -> Self {
        Self {
            label: DIMENSION_MISMATCH_LABEL.to_string(),
            confidence: 0.0,
            all_scores: BTreeMap::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

impl Default for ClassificationScore {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Valence/arousal quadrants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodQuadrant {
    /// High valence, high arousal
    Happy,

    /// High valence, low arousal
    Relaxed,

    /// Low valence, low arousal
    Sad,

    /// Low valence, high arousal
    Aggressive,
}

impl MoodQuadrant {
    /// Quadrant of `(valence, arousal)` around `center`; values equal to
    /// the center count as high
    pub fn classify(valence: f32, arousal: f32, center: f32) -> Self {
        match (valence >= center, arousal >= center) {
            (true, true) => Self::Happy,
            (true, false) => Self::Relaxed,
            (false, false) => Self::Sad,
            (false, true) => Self::Aggressive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Relaxed => "Relaxed",
            Self::Sad => "Sad",
            Self::Aggressive => "Aggressive",
        }
    }
}

impl std::fmt::Display for MoodQuadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Averaged mood regression output and the quadrant derived from it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodEstimate {
    pub valence: f32,
    pub arousal: f32,
    pub label: MoodQuadrant,

    /// Calibration center the quadrant was decided against
    pub center: f32,
}

impl MoodEstimate {
    pub fn new(valence: f32, arousal: f32, center: f32) -> Self {
        Self {
            valence,
            arousal,
            label: MoodQuadrant::classify(valence, arousal, center),
            center,
        }
    }

    /// Score form: fixed confidence of 1.0, raw valence/arousal as scores
    pub fn to_score(&self) -> ClassificationScore {
        let mut all_scores = BTreeMap::new();
        all_scores.insert("valence".to_string(), self.valence);
        all_scores.insert("arousal".to_string(), self.arousal);

        ClassificationScore {
            label: self.label.to_string(),
            confidence: 1.0,
            all_scores,
        }
    }
}

/// Combined genre, mood and tag output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub genres: ClassificationScore,
    pub moods: ClassificationScore,

    /// Detected tags in vocabulary order, without duplicates
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_estimate: Option<MoodEstimate>,
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self {
            genres: ClassificationScore::unknown(),
            moods: ClassificationScore::unknown(),
            tags: Vec::new(),
            mood_estimate: None,
        }
    }
}
