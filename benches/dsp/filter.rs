//! Benchmarks for the filter kernels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_sampler::dsp::filter::{BiquadFilter, FilterKernel, FilterType, SVFilter, Svf24};
use saavy_sampler::dsp::formant::FormantFilter;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

fn bench_kernel<K: FilterKernel>(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    name: &str,
    mut kernel: K,
    input: &[f32],
) {
    kernel.reset(FilterType::LowPass, SAMPLE_RATE, 0.4, 0.5);
    let mut buffer = input.to_vec();
    group.bench_with_input(BenchmarkId::new(name, input.len()), &input.len(), |b, _| {
        b.iter(|| {
            for (out, &x) in buffer.iter_mut().zip(input) {
                *out = kernel.output(x, black_box(0.4), black_box(0.5));
            }
            black_box(&buffer);
        })
    });
}

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        bench_kernel(&mut group, "svf12", SVFilter::default(), &input);
        bench_kernel(&mut group, "svf24", Svf24::default(), &input);
        bench_kernel(&mut group, "biquad", BiquadFilter::default(), &input);
        bench_kernel(&mut group, "formant", FormantFilter::default(), &input);

        // Cutoff sweeping every sample forces coefficient updates
        let mut filter = SVFilter::default();
        filter.reset(FilterType::LowPass, SAMPLE_RATE, 0.4, 0.5);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("svf12_sweep", size), &size, |b, _| {
            b.iter(|| {
                for (i, (out, &x)) in buffer.iter_mut().zip(&input).enumerate() {
                    let cutoff = 0.2 + 0.6 * i as f32 / size as f32;
                    *out = filter.output(x, cutoff, 0.5);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
