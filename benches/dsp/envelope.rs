//! Benchmarks for the parabolic envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_sampler::dsp::envelope::{Envelope, EnvelopeParams, EnvelopeState};
use saavy_sampler::synth::params::{ParamIndex, Params};

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    let mut env = Envelope::new(EnvelopeParams::DCA);
    env.set_frame_range(96, 480_000);
    let mut params = Params::default();
    params.set_value(ParamIndex::Dca1Attack, 1.0);
    params.set_value(ParamIndex::Dca1Release, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut state = EnvelopeState::default();
        env.start(&mut state, &params);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                for out in buffer.iter_mut() {
                    *out = state.tick();
                }
                black_box(&buffer);
            })
        });

        // Sustain phase (holding steady)
        let mut state = EnvelopeState::default();
        params.set_value(ParamIndex::Dca1Attack, 0.0);
        env.start(&mut state, &params);
        env.advance(&mut state, &params);
        while state.frames > 0 {
            state.tick();
        }
        env.advance(&mut state, &params);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                for out in buffer.iter_mut() {
                    *out = state.tick();
                }
                black_box(&buffer);
            })
        });

        // Release phase (ramping down)
        env.note_off(&mut state, &params);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                for out in buffer.iter_mut() {
                    *out = state.tick();
                }
                black_box(&buffer);
            })
        });
        params.set_value(ParamIndex::Dca1Attack, 1.0);
    }

    group.finish();
}
