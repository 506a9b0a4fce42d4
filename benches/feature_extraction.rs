use std::f32::consts::TAU;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use timbrelab::AudioSignal;
use timbrelab::analysis::extract;

const SAMPLE_RATE: u32 = 22_050;

fn tone(seconds: f32) -> AudioSignal {
    let count = (seconds * SAMPLE_RATE as f32) as usize;
    let samples = (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            0.5 * (TAU * 220.0 * t).sin() + 0.2 * (TAU * 660.0 * t).sin()
        })
        .collect();
    AudioSignal::new(samples, SAMPLE_RATE).expect("tone signal")
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    group.sample_size(10);
    for seconds in [2.0_f32, 10.0] {
        let signal = tone(seconds);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{seconds}s")),
            &signal,
            |b, signal| {
                b.iter(|| extract(black_box(signal)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
