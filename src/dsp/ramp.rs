//! Linear de-zipper ramps.
//!
//! A ramp glides from its current value to a new target over a fixed
//! number of frames so that parameter jumps never land as a step on the
//! audio path. Reads inside a block are offset-based (`value_at`), and the
//! block loop advances the ramp once afterwards (`process`).

use crate::RAMP_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    value: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl Default for Ramp {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Ramp {
    pub const fn new(value: f32) -> Self {
        Self {
            value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Jump to `value` with no interpolation.
    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.target = value;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Start a new glide from wherever the ramp currently sits.
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.remaining = RAMP_LENGTH;
        self.step = (target - self.value) / RAMP_LENGTH as f32;
    }

    /// Interpolated value `offset` frames into the current block.
    #[inline]
    pub fn value_at(&self, offset: u32) -> f32 {
        if offset >= self.remaining {
            self.target
        } else {
            self.value + self.step * offset as f32
        }
    }

    /// Advance the ramp by `frames`.
    pub fn process(&mut self, frames: u32) {
        if frames >= self.remaining {
            self.value = self.target;
            self.remaining = 0;
        } else {
            self.value += self.step * frames as f32;
            self.remaining -= frames;
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }
}
