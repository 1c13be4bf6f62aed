// Runs every analysis pipeline on a synthetic click track

use std::error::Error;
use std::f32::consts::PI;
use std::path::Path;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use music_analyzer::{
    audio::SampleBuffer,
    classification::{ClassificationAggregator, ClassifierModels},
    config::Config,
    AnalysisEngine, FullAnalysis, RhythmSummarizer, StructureSegmenter,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🎵 Testing Music Analyzer pipelines");
    let config = Config::default();

    // Test 1: Synthetic audio
    println!("\n1. Creating synthetic audio data...");
    let buffer = create_test_audio(config.rhythm.sample_rate, 120.0);
    println!("   ✅ Created test audio: {:.1}s duration", buffer.duration());

    // Test 2: Rhythm
    println!("\n2. Rhythm analysis...");
    let rhythm = RhythmSummarizer::from_config(&config.rhythm).summarize(&buffer)?;
    println!("   ✅ {:.1} BPM (confidence: {:.2}), {} beats, {} onsets",
             rhythm.bpm, rhythm.confidence, rhythm.beats.len(), rhythm.onsets.len());

    let min_gap = rhythm.onsets
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold(f64::INFINITY, f64::min);
    if min_gap.is_finite() {
        println!("   Smallest onset gap: {:.3}s", min_gap);
    }
    println!("   First 5 onsets: {:?}", &rhythm.onsets[..rhythm.onsets.len().min(5)]);

    // Test 3: Structure
    println!("\n3. Structural segmentation...");
    let structure = StructureSegmenter::from_config(&config.structure).segment(&buffer)?;
    for section in &structure.sections {
        println!("   {:>6.2}s - {:>6.2}s  {}", section.start, section.end, section.label);
    }

    // Test 4: Classification without models
    println!("\n4. Classification (no models)...");
    let classifier = ClassificationAggregator::new(ClassifierModels::none(), &config.classification);
    let classification = classifier.classify(&buffer)?;
    println!("   Genre: {}, mood: {}, tags: {:?}",
             classification.genres.label, classification.moods.label, classification.tags);

    // Test 5: Engine round trip through a WAV file
    println!("\n5. Full analysis through the engine...");
    let path = std::env::temp_dir().join(format!("music_analyzer_test_audio_{}.wav", std::process::id()));
    let engine = AnalysisEngine::new(config)?;
    let full = analyze_as_wav(&engine, &buffer, &path).await?;
    println!("{}", serde_json::to_string_pretty(&full)?);

    println!("\n🎉 All pipelines completed successfully!");
    Ok(())
}

/// 40 s track: quiet intro, alternating quiet and loud blocks, quiet outro,
/// with a click on every beat
fn create_test_audio(sample_rate: u32, bpm: f64) -> SampleBuffer {
    let mut rng = SmallRng::seed_from_u64(42);
    let duration = 40.0;
    let beat_interval = 60.0 / bpm;
    let num_samples = (sample_rate as f64 * duration) as usize;

    let samples = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;

            // Loud blocks carry a brighter, louder pad
            let loud = matches!(t as u32, 12..=19 | 28..=34);
            let (pad_freq, pad_gain) = if loud { (330.0, 0.35) } else { (220.0, 0.08) };
            let pad = (2.0 * PI * pad_freq * t).sin() * pad_gain;

            let beat_phase = (t as f64 % beat_interval) / beat_interval;
            let click = if beat_phase < 0.02 {
                let envelope = 1.0 - (beat_phase as f32 * 50.0);
                (2.0 * PI * 2000.0 * t).sin() * 0.5 * envelope
            } else {
                0.0
            };

            let noise = (rng.gen::<f32>() - 0.5) * 0.02;
            (pad + click + noise).clamp(-1.0, 1.0)
        })
        .collect();

    SampleBuffer::new(samples, sample_rate)
}

/// Write `buffer` to `path`, run the full analysis on it and delete the file,
/// whether or not the analysis succeeded
async fn analyze_as_wav(
    engine: &AnalysisEngine,
    buffer: &SampleBuffer,
    path: &Path,
) -> Result<FullAnalysis, Box<dyn Error>> {
    write_wav(path, buffer)?;
    let full = engine.analyze_full(path).await;
    std::fs::remove_file(path)?;
    Ok(full?)
}

fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in buffer.samples() {
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use music_analyzer::dsp::{BeatEstimate, BeatTracker};
    use music_analyzer::error::AudioError;
    use music_analyzer::OnsetFusionEngine;
    use tempfile::tempdir;

    struct FailingTracker;

    impl BeatTracker for FailingTracker {
        fn track(&self, _buffer: &SampleBuffer) -> music_analyzer::Result<BeatEstimate> {
            Err(AudioError::AnalysisFailed { reason: "no beats".to_string() }.into())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn short_track() -> SampleBuffer {
        SampleBuffer::new(vec![0.1; 44100], 44100)
    }

    #[tokio::test]
    async fn test_wav_removed_after_analysis() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.wav");
        let engine = AnalysisEngine::new(Config::default()).unwrap();

        let full = analyze_as_wav(&engine, &short_track(), &path).await.unwrap();
        assert!((full.rhythm.duration - 1.0).abs() < 1e-6);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_wav_removed_when_analysis_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.wav");
        let config = Config::default();
        let engine = AnalysisEngine::with_pipelines(
            config.clone(),
            RhythmSummarizer::new(Box::new(FailingTracker), OnsetFusionEngine::from_config(&config.rhythm)),
            StructureSegmenter::from_config(&config.structure),
            ClassificationAggregator::new(ClassifierModels::none(), &config.classification),
        );

        assert!(analyze_as_wav(&engine, &short_track(), &path).await.is_err());
        assert!(!path.exists());
    }
}
