//! # Music Analyzer
//!
//! Rhythm, structure and classification analysis of music recordings.
//!
//! The library turns noisy low-level signals into a single result per
//! recording: two onset-detection streams fused into one onset timeline,
//! change points turned into labeled sections, and per-frame model
//! activations reduced to genre, tag and mood results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use music_analyzer::{AnalysisEngine, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = AnalysisEngine::new(Config::default())?;
//! let analysis = engine.analyze_full("song.wav").await?;
//!
//! println!("{:.1} BPM", analysis.rhythm.bpm);
//! for section in &analysis.structure.sections {
//!     println!("{:>7.2}s {}", section.start, section.label);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`audio`] - Decoding, mono mixdown and resampling
//! - [`dsp`] - Spectral primitives: onset functions, peak picking, beat
//!   tracking, MFCCs, change points
//! - [`rhythm`] - Onset fusion and the rhythm summary
//! - [`structure`] - Labeled structural segmentation
//! - [`classification`] - Genre, tag and mood aggregation over model outputs
//! - [`analysis`] - File-level engine with worker threads and timeouts
//! - [`config`] - Configuration management
//!
//! ## Custom Backends
//!
//! Every primitive is a trait. A different beat tracker, for example, only
//! needs to implement [`BeatTracker`](dsp::BeatTracker):
//!
//! ```rust,no_run
//! use music_analyzer::audio::SampleBuffer;
//! use music_analyzer::dsp::{BeatEstimate, BeatTracker};
//! use music_analyzer::Result;
//!
//! struct MetronomeTracker;
//!
//! impl BeatTracker for MetronomeTracker {
//!     fn track(&self, buffer: &SampleBuffer) -> Result<BeatEstimate> {
//!         let beats = (0..(buffer.duration() * 2.0) as usize)
//!             .map(|i| i as f64 * 0.5)
//!             .collect();
//!         Ok(BeatEstimate { bpm: 120.0, beats, confidence: 1.0 })
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "metronome"
//!     }
//! }
//! ```

pub mod analysis;
pub mod audio;
pub mod classification;
pub mod config;
pub mod dsp;
pub mod error;
pub mod rhythm;
pub mod structure;

// Re-export commonly used types for convenience
pub use crate::{
    analysis::{AnalysisEngine, FullAnalysis},
    audio::SampleBuffer,
    classification::{ClassificationAggregator, ClassificationResult, ModelRegistry},
    config::Config,
    error::{AnalyzerError, Result},
    rhythm::{OnsetFusionEngine, RhythmResult, RhythmSummarizer},
    structure::{StructureResult, StructureSegmenter},
};
