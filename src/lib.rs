//! Realtime-safe polyphonic sample-playback synthesis core.
//!
//! A single audio sample is played back polyphonically: each MIDI note
//! allocates a voice from a fixed pool, resamples the sample at the note's
//! pitch, and runs it through a filter, three envelopes, an LFO and a stereo
//! output stage. An independent FFT phase vocoder is provided for offline
//! pitch shifting of rendered buffers.

pub mod config;
pub mod dsp; // Envelopes, filters, LFO, FFT, pitch shifting
pub mod error;
pub mod io; // MIDI decoding and controller forwarding
pub mod sample; // Sample buffer and interpolating generator
pub mod synth; // Voice pool, parameters, and the block engine

pub use config::EngineConfig;
pub use error::{Result, SamplerError};
pub use synth::engine::SamplerEngine;
pub use synth::params::ParamIndex;

/// Fixed voice capacity of the engine.
pub const MAX_VOICES: usize = 32;
/// Size of the MIDI note table.
pub const MAX_NOTES: usize = 128;
/// Largest block processed in one pass; bigger host blocks are chunked.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Length in frames of every parameter and voice ramp.
pub const RAMP_LENGTH: u32 = 32;
