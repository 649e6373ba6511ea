//! Benchmarks for the phase vocoder with both FFT kernels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_sampler::dsp::pshifter::{PhaseVocoder, PitchShifter};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;
const FFT_SIZE: usize = 1024;
const OVERSAMPLING: usize = 4;

pub fn bench_pshifter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pshifter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 * 0.07).sin())
            .collect();
        let mut buffer = input.clone();

        let mut radix2 = PhaseVocoder::new(1, SAMPLE_RATE, FFT_SIZE, OVERSAMPLING);
        group.bench_with_input(BenchmarkId::new("radix2", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                radix2.process(&mut [buffer.as_mut_slice()], black_box(1.5));
            })
        });

        let mut rustfft =
            PhaseVocoder::with_rustfft(1, SAMPLE_RATE, FFT_SIZE, OVERSAMPLING).unwrap();
        group.bench_with_input(BenchmarkId::new("rustfft", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                rustfft.process(&mut [buffer.as_mut_slice()], black_box(1.5));
            })
        });
    }

    group.finish();
}
