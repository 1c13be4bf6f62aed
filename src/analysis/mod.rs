//! # Analysis Module
//!
//! The [`AnalysisEngine`] decodes audio files and runs the rhythm,
//! structure and classification pipelines on blocking worker threads under
//! a deadline.

pub mod engine;
pub mod types;

pub use engine::AnalysisEngine;
pub use types::FullAnalysis;
