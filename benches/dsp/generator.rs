//! Benchmarks for sample playback.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_sampler::sample::{Generator, Sample};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/generator");

    let data: Vec<f32> = (0..SAMPLE_RATE as usize)
        .map(|i| (i as f32 * 0.05).sin())
        .collect();
    let sample = Sample::from_frames(vec![data.clone(), data], SAMPLE_RATE, 440.0).unwrap();

    let mut looped = sample.clone();
    looped.set_loop_range(1_000, 20_000);
    looped.set_loop(true);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut gen = Generator::default();
        gen.start(&sample);
        group.bench_with_input(BenchmarkId::new("one_shot", size), &size, |b, _| {
            b.iter(|| {
                if gen.is_over(&sample) {
                    gen.start(&sample);
                }
                for out in buffer.iter_mut() {
                    gen.next(&sample, black_box(523.25));
                    *out = gen.value(&sample, 0) + gen.value(&sample, 1);
                }
                black_box(&buffer);
            })
        });

        let mut gen = Generator::default();
        gen.start(&looped);
        group.bench_with_input(BenchmarkId::new("looped", size), &size, |b, _| {
            b.iter(|| {
                for out in buffer.iter_mut() {
                    gen.next(&looped, black_box(880.0));
                    *out = gen.value(&looped, 0);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
