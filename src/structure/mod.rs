//! # Structure Module
//!
//! Structural segmentation into labeled sections (intro, verse, chorus,
//! outro). Short or uniform recordings that do not yield enough boundaries
//! come back as a single `full` section.

pub mod segmenter;
pub mod types;

pub use segmenter::{boundaries_from_frames, StructureSegmenter};
pub use types::{LabelDecision, Section, SectionLabel, StructureResult};
