//! Benchmarks for low-level DSP primitives.

mod envelope;
mod filter;
mod generator;
mod pshifter;

pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use generator::bench_generator;
pub use pshifter::bench_pshifter;
