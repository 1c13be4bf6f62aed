use std::f32::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use music_analyzer::config::RhythmConfig;
use music_analyzer::rhythm::{merge_candidates, OnsetFusionEngine};
use music_analyzer::SampleBuffer;

fn candidate_lists(count: usize) -> (Vec<f64>, Vec<f64>) {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut first: Vec<f64> = (0..count).map(|_| rng.gen_range(0.0..300.0)).collect();
    let mut second: Vec<f64> = (0..count).map(|_| rng.gen_range(0.0..300.0)).collect();
    first.sort_by(f64::total_cmp);
    second.sort_by(f64::total_cmp);
    (first, second)
}

fn click_track(seconds: usize) -> SampleBuffer {
    let rate = 44100;
    let samples = (0..rate * seconds)
        .map(|i| {
            let t = i as f32 / rate as f32;
            if i % 22050 < 441 {
                (2.0 * PI * 2000.0 * t).sin() * 0.6
            } else {
                0.0
            }
        })
        .collect();
    SampleBuffer::new(samples, rate as u32)
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_candidates");
    for count in [100, 1_000, 10_000] {
        let (first, second) = candidate_lists(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| merge_candidates(black_box(&first), black_box(&second), 50))
        });
    }
    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let engine = OnsetFusionEngine::from_config(&RhythmConfig::default());
    let buffer = click_track(10);

    c.bench_function("onset_fusion_detect_10s", |b| {
        b.iter(|| engine.detect(black_box(&buffer)))
    });
}

criterion_group!(benches, bench_merge, bench_detect);
criterion_main!(benches);
