use super::Sample;

/*
Sample Playback Generator
=========================

Reads the shared sample at an arbitrary, continuously varying speed.

Vocabulary
----------

  phase       Fractional read position in frames.

  index       floor(phase) at the last `next`; the interpolation stencil
              starts one frame before it.

  frame       Highest index reached so far. Non-looping playback is over
              once `frame` passes the sample length.

  gain        Loop crossfade gain in [0, 1]. Ramps down approaching the loop
              end and back up after wrapping, hiding the splice.


Resampling
----------

Each output frame advances the phase by `freq · ratio`, where ratio folds
the source rate, the host rate and the sample's base frequency together.
Playing at the base frequency advances exactly one source frame per output
frame at matching rates.

Values between frames come from a 4-point Catmull-Rom spline over
x0 = s[i−1], x1 = s[i], x2 = s[i+1], x3 = s[i+2] at fraction a:

    c1 = (x2 − x0) / 2
    b1 = x1 − x2
    b2 = c1 + b1
    c3 = (x3 − x1) / 2 + b2 + b1
    c2 = c3 + b2
    y  = ((c3·a − c2)·a + c1)·a + x1


Loop Crossfade
--------------

          phase2 − xfade     phase2
                │              │
  gain 1 ───────┐              │
                 ╲             │
                  ╲____________│ wrap: phase −= loop length
                               │ gain restarts low and climbs back

`xfade` is 32 steps' worth of the current phase increment, so the fade
always lasts about 32 output frames regardless of pitch.
*/

const XFADE_STEPS: f32 = 32.0;
const XFADE_STEP: f32 = 1.0 / XFADE_STEPS;

#[derive(Debug, Clone, Copy)]
pub struct Generator {
    phase: f32,
    index: u32,
    alpha: f32,
    frame: u32,
    looping: bool,
    loop_phase1: f32,
    loop_phase2: f32,
    gain: f32,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            phase: 0.0,
            index: 0,
            alpha: 0.0,
            frame: 0,
            looping: false,
            loop_phase1: 0.0,
            loop_phase2: 0.0,
            gain: 1.0,
        }
    }
}

impl Generator {
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.index = 0;
        self.alpha = 0.0;
        self.frame = 0;
        self.gain = 1.0;
    }

    /// Follow or drop the sample's loop region.
    pub fn set_loop(&mut self, sample: &Sample, looping: bool) {
        self.looping = looping && sample.is_loop();
        self.gain = 1.0;
        if self.looping {
            self.loop_phase1 = sample.loop_phase1();
            self.loop_phase2 = sample.loop_phase2();
        } else {
            self.loop_phase1 = 0.0;
            self.loop_phase2 = 0.0;
        }
    }

    /// Rewind for a new note, picking up the sample's loop setting.
    pub fn start(&mut self, sample: &Sample) {
        self.reset();
        self.set_loop(sample, sample.is_loop());
    }

    /// Advance by one output frame at `freq` Hz.
    #[inline]
    pub fn next(&mut self, sample: &Sample, freq: f32) {
        let delta = freq * sample.ratio();

        self.index = self.phase.max(0.0) as u32;
        self.alpha = self.phase - self.index as f32;
        self.phase += delta;

        if self.looping {
            let xfade = XFADE_STEPS * delta;
            if self.phase >= self.loop_phase2 - xfade {
                self.gain = (self.gain - XFADE_STEP).max(0.0);
            } else if self.gain < 1.0 {
                self.gain = (self.gain + XFADE_STEP).min(1.0);
            }
            if self.phase >= self.loop_phase2 {
                self.phase -= self.loop_phase1;
                if self.phase < 0.0 {
                    self.phase = 0.0;
                    self.gain = 0.0;
                } else {
                    self.gain = XFADE_STEP;
                }
            }
        }

        self.frame = self.frame.max(self.index);
    }

    /// Interpolated value of channel `k` at the current position.
    #[inline]
    pub fn value(&self, sample: &Sample, k: u16) -> f32 {
        if self.is_over(sample) {
            return 0.0;
        }
        let Some([x0, x1, x2, x3]) = sample.stencil(k, self.index) else {
            return 0.0;
        };
        let c1 = (x2 - x0) * 0.5;
        let b1 = x1 - x2;
        let b2 = c1 + b1;
        let c3 = (x3 - x1) * 0.5 + b2 + b1;
        let c2 = c3 + b2;
        let a = self.alpha;
        self.gain * (((c3 * a - c2) * a + c1) * a + x1)
    }

    #[inline]
    pub fn is_over(&self, sample: &Sample) -> bool {
        !self.looping && sample.is_over(self.frame)
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}
