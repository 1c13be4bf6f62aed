//! # Audio Ingestion Module
//!
//! Turns audio files into the mono [`SampleBuffer`] every analysis pipeline
//! consumes.
//!
//! ## Core Features
//!
//! - **Decoding**: WAV through `hound`, MP3/FLAC/OGG/AAC through `symphonia`
//! - **Mixdown**: interleaved channels averaged to mono
//! - **Resampling**: pluggable [`Resampler`], band-limited FFT resampling by default
//!
//! ## Usage
//!
//! ```rust,no_run
//! use music_analyzer::audio::AudioLoader;
//!
//! # fn main() -> anyhow::Result<()> {
//! let buffer = AudioLoader::load("song.wav", 44100)?;
//! println!("Loaded {:.1}s at {} Hz", buffer.duration(), buffer.sample_rate());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod resample;
pub mod types;
pub use loader::AudioLoader;
pub use resample::{FftResampler, LinearResampler, Resampler};
pub use types::SampleBuffer;
