//! Low Frequency Oscillator (LFO) for per-voice modulation.

/*
Low Frequency Oscillators
=========================

Every voice owns an `Lfo` (just a phase and a random source) while the
waveform itself is a shared `LfoWave`, so changing the shape or width
knob reshapes every running voice at once.

Vocabulary
----------

  phase       Position within one cycle, [0, 1).

  width       Shape morph control in [0, 1]. What it does depends on the
              shape (see below). At width = 1 every shape is "classic".

  sweep       Envelope-driven speed-up: the LFO's frequency is scaled by
              (1 + 0.5 · sweep · lfo_env), so the wobble accelerates while
              the LFO envelope is open.

  sync        When on, a voice's LFO starts at the phase of a shared
              free-running phasor instead of zero. All synced voices then
              wobble together regardless of when their notes began.

  bipolar     Output swings −1.0 to +1.0.


Shapes and Width
----------------

PULSE
    Duty cycle = 0.5 · width. Width 1 is a square, width → 0 a thin spike.

      ┌──┐  ┌──┐
      │  │  │  │
    ──┘  └──┘  └──

SAW
    Rises over [0, width), falls over [width, 1). Width 1 is a rising saw,
    width 0.5 a triangle, width 0 a falling saw.

      ╱╲    ╱╲           ╱│ ╱│
     ╱  ╲  ╱  ╲         ╱ │╱ │
        ╲╱    ╲╱         width = 1
     width = 0.5

SINE
    Phase-distorted sine: the first half-cycle is squeezed into
    [0, 0.5 · width), the second stretched across the rest.

RANDOM
    Sample-and-hold. A new random level is drawn once per cycle.

NOISE
    A new random level every frame.


Rate
----

The rate knob picks a beat division of the tempo:

    freq = bpm / (60.01 − rate · 60)

rate = 0 is one cycle per minute-ish (bpm/60 Hz), rate = 1 runs toward
bpm/0.01 Hz, well into audio territory.
*/

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shared phasor length, in frames.
pub const PHASOR_SIZE: u32 = 1024;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoShape {
    Pulse,
    #[default]
    Saw,
    Sine,
    Random,
    Noise,
}

impl LfoShape {
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            0 => Self::Pulse,
            1 => Self::Saw,
            2 => Self::Sine,
            3 => Self::Random,
            4 => Self::Noise,
            _ => Self::Saw,
        }
    }
}

/// Shape and width shared by every voice's LFO.
#[derive(Debug, Clone, Copy)]
pub struct LfoWave {
    shape: LfoShape,
    width: f32,
    sample_rate: f32,
}

impl LfoWave {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            shape: LfoShape::default(),
            width: 1.0,
            sample_rate,
        }
    }

    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Apply a new shape/width pair, returning whether anything changed.
    pub fn reset_test(&mut self, shape: LfoShape, width: f32) -> bool {
        let width = width.clamp(0.0, 1.0);
        if shape == self.shape && width == self.width {
            return false;
        }
        self.shape = shape;
        self.width = width;
        true
    }

    /// Deterministic shapes evaluated at `phase`; random shapes return 0.
    pub fn eval(&self, phase: f32) -> f32 {
        let w = self.width;
        match self.shape {
            LfoShape::Pulse => {
                if phase < 0.5 * w {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoShape::Saw => {
                if phase < w {
                    2.0 * phase / w - 1.0
                } else if w < 1.0 {
                    1.0 - 2.0 * (phase - w) / (1.0 - w)
                } else {
                    1.0
                }
            }
            LfoShape::Sine => {
                let w2 = 0.5 * w;
                let angle = if phase < w2 {
                    0.5 * phase / w2
                } else {
                    0.5 + 0.5 * (phase - w2) / (1.0 - w2)
                };
                (TAU * angle).sin()
            }
            LfoShape::Random | LfoShape::Noise => 0.0,
        }
    }
}

/// Per-voice oscillator state.
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    held: f32,
    rng: fastrand::Rng,
}

impl Lfo {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: 0.0,
            held: 0.0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Restart at `phase_shift` and return the first value.
    pub fn start(&mut self, wave: &LfoWave, phase_shift: f32) -> f32 {
        self.phase = phase_shift.rem_euclid(1.0);
        self.held = self.random();
        self.value(wave)
    }

    /// Return the current value, then advance by `freq` Hz worth of phase.
    #[inline]
    pub fn sample(&mut self, wave: &LfoWave, freq: f32) -> f32 {
        let value = self.value(wave);
        self.phase += freq / wave.sample_rate;
        if self.phase >= 1.0 {
            self.phase = self.phase.fract();
            self.held = self.random();
        }
        value
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    fn value(&mut self, wave: &LfoWave) -> f32 {
        match wave.shape {
            LfoShape::Random => self.held,
            LfoShape::Noise => self.random(),
            _ => wave.eval(self.phase),
        }
    }

    #[inline]
    fn random(&mut self) -> f32 {
        2.0 * self.rng.f32() - 1.0
    }
}

/// LFO rate in Hz from a tempo and the normalized rate knob.
#[inline]
pub fn lfo_frequency(bpm: f32, rate: f32) -> f32 {
    bpm / (60.01 - rate * 60.0)
}

/// Free-running frame counter shared by synced LFOs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phasor {
    frames: u32,
}

impl Phasor {
    pub fn process(&mut self, nframes: u32) {
        self.frames = (self.frames + nframes) % PHASOR_SIZE;
    }

    pub fn phase_shift(&self) -> f32 {
        self.frames as f32 / PHASOR_SIZE as f32
    }

    pub fn reset(&mut self) {
        self.frames = 0;
    }
}
