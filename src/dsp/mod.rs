//! Low-level signal primitives behind the analysis pipelines.
//!
//! Each primitive is a trait so the pipelines can be driven by other
//! backends (or by fixed values in tests); the types here are the in-crate
//! defaults.

pub mod beat;
pub mod change_point;
pub mod mfcc;
pub mod onset;
pub mod peaks;
pub mod spectrum;

pub use beat::{BeatEstimate, BeatTracker, IntervalBeatTracker};
pub use change_point::{BicChangePointDetector, ChangePointDetector};
pub use mfcc::{CepstralExtractor, MelSpectrogram, MfccExtractor};
pub use onset::{DetectionSeries, OnsetFunction, OnsetMethod, SpectralOnsetFunction};
pub use peaks::{AdaptivePeakPicker, PeakPicker};
pub use spectrum::Stft;
