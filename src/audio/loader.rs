use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::resample::{FftResampler, Resampler};
use crate::audio::types::{mix_to_mono, SampleBuffer};
use crate::error::{AudioError, Result};

/// Interleaved samples straight out of a decoder
struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

/// Audio file loader producing mono buffers at a fixed sample rate
pub struct AudioLoader;

impl AudioLoader {
    /// Decode an audio file, mix it to mono and resample it to `target_rate`
    pub fn load<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<SampleBuffer> {
        Self::load_with(path, target_rate, &FftResampler::default())
    }

    /// Same as [`AudioLoader::load`] with a caller-chosen resampler
    pub fn load_with<P: AsRef<Path>>(
        path: P,
        target_rate: u32,
        resampler: &dyn Resampler,
    ) -> Result<SampleBuffer> {
        let path = path.as_ref();
        let extension = Self::detect_format(path).unwrap_or_default();

        let decoded = match extension.as_str() {
            "wav" => Self::decode_wav(path)?,
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::decode_with_symphonia(path)?,
            _ => return Err(AudioError::UnsupportedFormat {
                format: extension
            }.into()),
        };

        tracing::debug!(
            "Decoded {:?}: {} Hz, {} channels, {} interleaved samples",
            path,
            decoded.sample_rate,
            decoded.channels,
            decoded.samples.len()
        );

        let mono = SampleBuffer::new(
            mix_to_mono(&decoded.samples, decoded.channels),
            decoded.sample_rate,
        );

        if mono.sample_rate() == target_rate {
            return Ok(mono);
        }
        resampler.resample(&mono, target_rate)
    }

    /// Decode WAV files using the hound crate (most reliable for WAV)
    fn decode_wav(path: &Path) -> Result<DecodedAudio> {
        let load_failed = || AudioError::LoadFailed {
            path: path.display().to_string()
        };

        let reader = hound::WavReader::open(path).map_err(|_| load_failed())?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| load_failed())?,
            hound::SampleFormat::Int => {
                let bit_depth = spec.bits_per_sample;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|s| Self::int_to_float(s, bit_depth)))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| load_failed())?
            }
        };

        Ok(DecodedAudio {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels as usize,
        })
    }

    /// Decode compressed formats using Symphonia
    fn decode_with_symphonia(path: &Path) -> Result<DecodedAudio> {
        let load_failed = || AudioError::LoadFailed {
            path: path.display().to_string()
        };

        let file = File::open(path).map_err(|_| load_failed())?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| load_failed())?;

        let mut format = probed.format;

        // First audio track with a decodable codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(load_failed)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params.sample_rate
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No sample rate found".to_string()
            })?;

        let channels = codec_params.channels
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No channel information found".to_string()
            })?
            .count();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();
        let mut decode_buffer: Option<DecodeBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream
                Err(SymphoniaError::IoError(_)) => break,
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let buffer = decode_buffer.get_or_insert_with(|| {
                        DecodeBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
                    });
                    if buffer.capacity() < decoded.capacity() * channels {
                        *buffer = DecodeBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    }
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::DecodeError(reason)) => {
                    tracing::warn!("Skipping undecodable packet in {:?}: {}", path, reason);
                    continue;
                }
                Err(_) => break,
            }
        }

        if samples.is_empty() {
            return Err(load_failed().into());
        }

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Convert integer sample to float (-1.0 to 1.0)
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => (sample as f32 - 128.0) / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0,
        }
    }

    /// Detect audio format from file extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioLoader::detect_format("test.wav"), Some("wav".to_string()));
        assert_eq!(AudioLoader::detect_format("test.MP3"), Some("mp3".to_string()));
        assert_eq!(AudioLoader::detect_format("test"), None);
    }

    #[test]
    fn test_format_support() {
        assert!(AudioLoader::is_format_supported("wav"));
        assert!(AudioLoader::is_format_supported("FLAC"));
        assert!(!AudioLoader::is_format_supported("xyz"));
    }

    #[test]
    fn test_int_to_float_conversion() {
        assert_eq!(AudioLoader::int_to_float(0, 16), 0.0);
        assert_eq!(AudioLoader::int_to_float(-32768, 16), -1.0);
        assert_eq!(AudioLoader::int_to_float(128, 8), 0.0);
        assert_eq!(AudioLoader::int_to_float(0, 8), -1.0);
    }

    #[test]
    fn test_load_stereo_wav_as_mono() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // L = 0.5, R = 0.0 for 100 frames
        let interleaved: Vec<i16> = (0..100).flat_map(|_| [16384i16, 0]).collect();
        write_wav(&path, 8000, 2, &interleaved);

        let buffer = AudioLoader::load(&path, 8000).unwrap();
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.len(), 100);
        assert!(buffer.samples().iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_load_resamples_to_target_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 8000, 1, &vec![0i16; 8000]);

        let buffer = AudioLoader::load(&path, 16000).unwrap();
        assert_eq!(buffer.sample_rate(), 16000);
        assert_eq!(buffer.len(), 16000);
    }

    #[test]
    fn test_unsupported_format() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.xyz");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"dummy content").unwrap();

        match AudioLoader::load(&file_path, 44100) {
            Err(AnalyzerError::Audio(AudioError::UnsupportedFormat { format })) => {
                assert_eq!(format, "xyz");
            }
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_wav_is_input_error() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("broken.wav");
        std::fs::write(&file_path, b"not a riff header").unwrap();

        let err = AudioLoader::load(&file_path, 44100).unwrap_err();
        assert!(err.is_input_error());
    }
}
