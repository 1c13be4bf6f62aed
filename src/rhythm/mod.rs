//! # Rhythm Module
//!
//! Tempo, beat positions and a fused onset timeline.
//!
//! Onsets come from two detection functions, a percussive one (high
//! frequency content) and a tonal one (complex-domain deviation). Each is
//! peak-picked on its own; [`OnsetFusionEngine`] merges the two candidate
//! lists and enforces a minimum gap between consecutive onsets.
//!
//! ```rust,no_run
//! use music_analyzer::{audio::AudioLoader, config::RhythmConfig, rhythm::RhythmSummarizer};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = RhythmConfig::default();
//! let buffer = AudioLoader::load("song.wav", config.sample_rate)?;
//! let rhythm = RhythmSummarizer::from_config(&config).summarize(&buffer)?;
//! println!("{:.1} BPM, {} onsets", rhythm.bpm, rhythm.onsets.len());
//! # Ok(())
//! # }
//! ```

pub mod fusion;
pub mod summarizer;
pub mod types;

pub use fusion::{merge_candidates, OnsetFusionEngine};
pub use summarizer::RhythmSummarizer;
pub use types::RhythmResult;
