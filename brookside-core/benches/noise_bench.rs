//! Benchmarks for noise buffer synthesis and voice filtering.

use std::hint::black_box;

use brookside_core::filters::{SvfMode, SvfTpt};
use brookside_core::noise::{pink_noise, water_noise};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

const SAMPLE_RATES: &[f32] = &[44_100.0, 48_000.0];

fn bench_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise");
    group.sample_size(20);

    for &sr in SAMPLE_RATES {
        let mut rng = StdRng::seed_from_u64(1);
        group.bench_with_input(BenchmarkId::new("pink_8s", sr as u32), &sr, |b, &sr| {
            b.iter(|| pink_noise(black_box(8.0), sr, &mut rng));
        });

        let mut rng = StdRng::seed_from_u64(2);
        group.bench_with_input(BenchmarkId::new("water_6s", sr as u32), &sr, |b, &sr| {
            b.iter(|| water_noise(black_box(6.0), sr, &mut rng));
        });
    }
    group.finish();
}

fn bench_svf(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters/svf");
    let input = pink_noise(1.0, 48_000.0, &mut StdRng::seed_from_u64(3));

    for (name, mode, cut, q) in [("wind_lowpass", SvfMode::Lowpass, 750.0, 0.6), ("stream_bandpass", SvfMode::Bandpass, 950.0, 1.1)] {
        let mut svf = SvfTpt::new(mode, cut, q, 48_000.0);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut acc = 0.0_f32;
                for &x in input.channel(0) {
                    acc += svf.process(black_box(x));
                }
                acc
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_noise, bench_svf);
criterion_main!(benches);
