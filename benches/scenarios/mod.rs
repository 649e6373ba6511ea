//! Real-world scenario benchmarks.
//!
//! These benchmarks drive the full engine the way a host would: MIDI in,
//! one process call per block.

mod voices;

pub use voices::bench_voices;
