//! Low-level DSP primitives used by the voice and engine layers.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the
//! signal-processing math; scheduling and modulation routing live in `synth`.

/// Parabolic attack/decay/sustain/release envelope.
pub mod envelope;
/// In-place FFT kernels for the phase vocoder.
pub mod fft;
/// Filter kernels: state-variable, cascaded, biquad.
pub mod filter;
/// Five-band vowel formant filter.
pub mod formant;
/// Portamento offset.
pub mod glide;
/// Low-frequency oscillator and its sync phasor.
pub mod lfo;
/// FFT phase-vocoder pitch shifter.
pub mod pshifter;
/// Linear de-zipper ramps.
pub mod ramp;
/// Saturation and velocity curves.
pub mod shaping;

pub use envelope::{Envelope, EnvelopeState};
pub use pshifter::{PhaseVocoder, PitchShifter};
