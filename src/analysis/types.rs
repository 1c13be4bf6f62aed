use serde::{Deserialize, Serialize};

use crate::classification::ClassificationResult;
use crate::rhythm::RhythmResult;
use crate::structure::StructureResult;

/// Combined result of every pipeline
///
/// Rhythm fields sit at the top level of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullAnalysis {
    #[serde(flatten)]
    pub rhythm: RhythmResult,

    pub structure: StructureResult,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Section, SectionLabel};

    #[test]
    fn test_rhythm_fields_flattened() {
        let analysis = FullAnalysis {
            rhythm: RhythmResult {
                bpm: 120.0,
                beats: vec![0.5, 1.0],
                confidence: 0.8,
                onsets: vec![0.25],
                duration: 2.0,
            },
            structure: StructureResult {
                sections: vec![Section::new(0.0, 2.0, SectionLabel::Full)],
                boundaries: vec![0.0, 2.0],
            },
            classification: None,
        };

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["bpm"], 120.0);
        assert_eq!(json["duration"], 2.0);
        assert_eq!(json["structure"]["sections"][0]["label"], "full");
        assert!(json.get("classification").is_none());

        let back: FullAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(back, analysis);
    }
}
