//! Benchmarks for full engine blocks at different polyphony levels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_sampler::{sample::Sample, EngineConfig, ParamIndex, SamplerEngine, MAX_VOICES};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

fn engine(block: usize, slope: f32) -> SamplerEngine {
    let mut engine = SamplerEngine::new(EngineConfig {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        buffer_size: block,
        tempo: 120.0,
    })
    .unwrap();
    let period = SAMPLE_RATE / 261.63;
    let data: Vec<f32> = (0..SAMPLE_RATE as usize)
        .map(|i| 2.0 * (i as f32 / period).fract() - 1.0)
        .collect();
    engine.set_sample(Sample::from_frames(vec![data], SAMPLE_RATE, 261.63).unwrap());
    engine.set_loop(true);
    engine.set_param_value(ParamIndex::Dcf1Slope, slope);
    engine.set_param_value(ParamIndex::Lfo1Pitch, 0.2);
    engine.set_param_value(ParamIndex::Lfo1Cutoff, 0.3);
    engine
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // === SINGLE NOTE ===
        // baseline: one voice through the 12 dB filter
        let mut single = engine(size, 0.0);
        single.process_midi(&[0x90, 60, 100]);
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| {
                single.process(&[], &mut [left.as_mut_slice(), right.as_mut_slice()], size);
                black_box(&left);
            })
        });

        // === CHORD ===
        // eight voices, 24 dB filter
        let mut chord = engine(size, 1.0);
        for key in [48, 52, 55, 59, 60, 64, 67, 71] {
            chord.process_midi(&[0x90, key, 100]);
        }
        group.bench_with_input(BenchmarkId::new("chord_8", size), &size, |b, _| {
            b.iter(|| {
                chord.process(&[], &mut [left.as_mut_slice(), right.as_mut_slice()], size);
                black_box(&left);
            })
        });

        // === FULL POLYPHONY ===
        // every voice busy, formant filter (the most expensive kernel)
        let mut full = engine(size, 3.0);
        for key in 0..MAX_VOICES as u8 {
            full.process_midi(&[0x90, 40 + key, 100]);
        }
        group.bench_with_input(BenchmarkId::new("full_formant", size), &size, |b, _| {
            b.iter(|| {
                full.process(&[], &mut [left.as_mut_slice(), right.as_mut_slice()], size);
                black_box(&left);
            })
        });
    }

    group.finish();
}
