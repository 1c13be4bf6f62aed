use serde::{Deserialize, Serialize};

/// Section labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLabel {
    /// Introduction
    Intro,

    /// Verse section
    Verse,

    /// Chorus section
    Chorus,

    /// Outro/ending
    Outro,

    /// Whole track, used when there are too few boundaries to segment
    Full,
}

impl SectionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Verse => "verse",
            Self::Chorus => "chorus",
            Self::Outro => "outro",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a section's label was decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelDecision {
    /// Midpoint fell in the leading or trailing edge of the track
    Positional(SectionLabel),

    /// Interior section, labeled by its mean squared amplitude
    Energy { label: SectionLabel, energy: f64 },
}

impl LabelDecision {
    pub fn label(&self) -> SectionLabel {
        match self {
            Self::Positional(label) => *label,
            Self::Energy { label, .. } => *label,
        }
    }
}

/// A labeled `[start, end)` span of the track, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub start: f64,
    pub end: f64,
    pub label: SectionLabel,
    pub duration: f64,
}

impl Section {
    pub fn new(start: f64, end: f64, label: SectionLabel) -> Self {
        Self {
            start,
            end,
            label,
            duration: end - start,
        }
    }
}

/// Ordered sections plus the boundary list they were cut from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureResult {
    pub sections: Vec<Section>,

    /// Boundary timestamps in seconds, including 0 and the track duration
    pub boundaries: Vec<f64>,
}

impl StructureResult {
    /// Whether this result is the single-section fallback
    pub fn is_fallback(&self) -> bool {
        self.sections.len() == 1 && self.sections[0].label == SectionLabel::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_duration() {
        let section = Section::new(1.5, 4.0, SectionLabel::Verse);
        assert_eq!(section.duration, 2.5);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&Section::new(0.0, 1.0, SectionLabel::Chorus)).unwrap();
        assert!(json.contains("\"label\":\"chorus\""));
        assert_eq!(SectionLabel::Full.to_string(), "full");
    }

    #[test]
    fn test_multi_section_is_not_fallback() {
        let result = StructureResult {
            sections: vec![
                Section::new(0.0, 2.0, SectionLabel::Intro),
                Section::new(2.0, 5.0, SectionLabel::Verse),
            ],
            boundaries: vec![0.0, 2.0, 5.0],
        };
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_decision_label() {
        assert_eq!(LabelDecision::Positional(SectionLabel::Intro).label(), SectionLabel::Intro);
        let energy = LabelDecision::Energy { label: SectionLabel::Chorus, energy: 0.1 };
        assert_eq!(energy.label(), SectionLabel::Chorus);
    }
}
