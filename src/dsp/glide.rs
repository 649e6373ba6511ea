//! Portamento offset.
//!
//! A glide is an additive frequency offset that starts at the distance from
//! the previous note's frequency and shrinks linearly to zero. The generator
//! adds `tick()` to the note frequency every frame.

#[derive(Debug, Clone, Copy, Default)]
pub struct Glide {
    frames: u32,
    offset: f32,
    step: f32,
}

impl Glide {
    /// Begin a glide from `*last` to `freq` over `frames`, then record `freq`
    /// as the new last frequency.
    pub fn reset(&mut self, frames: u32, freq: f32, last: &mut f32) {
        self.frames = frames;
        if frames > 0 {
            self.offset = *last - freq;
            self.step = self.offset / frames as f32;
        } else {
            self.offset = 0.0;
            self.step = 0.0;
        }
        *last = freq;
    }

    #[inline]
    pub fn tick(&mut self) -> f32 {
        if self.frames > 0 {
            self.offset -= self.step;
            self.frames -= 1;
            if self.frames == 0 {
                self.offset = 0.0;
            }
        }
        self.offset
    }
}
