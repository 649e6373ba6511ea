use crate::synth::params::{ParamIndex, Params};

/*
Parabolic ADSR Envelope
=======================

Every voice carries three of these: amplitude (DCA), filter (DCF) and LFO
depth. The per-voice part is a small `EnvelopeState`; the shared part is an
`Envelope`, which knows which parameters hold the attack/decay/sustain/
release knobs and how long a full-scale stage may last.


Vocabulary
----------

  stage       Idle, Attack, Decay, Sustain or Release.

  segment     One stage's curve. A segment is described by two coefficients
              and a frame count; the state walks `phase` from 0 to 1 across
              those frames.

  frames      Frames left in the current segment. The voice scheduler reads
              this to cut blocks at stage boundaries.

  running     True while a segment is in progress. Sustain is the only
              non-idle stage that does not run: it just holds its value.


The Shape: One Parabola Per Segment
-----------------------------------

    value = c1 · phase · (2 − phase) + c0

At phase 0 the value is c0; at phase 1 it is c1 + c0. The slope is steepest
at the start and flat at the end, so every segment eases into its target.

  Level
    1.0 ┐   .──.
        │  /     `─.
    S   │ /         `────────────.
        │/                        `.
    0.0 └──────────────────────────`──→ Time
        Attack Decay   Sustain    Release

  Attack   c0 = 0,      c1 = 1               (0 → 1)
  Decay    c0 = value,  c1 = sustain − value (1 → sustain)
  Sustain  c0 = value,  c1 = 0               (hold)
  Release  c0 = value,  c1 = −value          (value → 0)

Release always starts from the CURRENT value, so letting go during the
attack never clicks.


Knob to Frames
--------------

Stage knobs are normalized to [0, 1] and mapped quadratically:

    frames = round(knob² · max_frames)

`max_frames` comes from the global envelope-time control, so the same knob
position scales with it. Decay and release never drop below `min_frames`,
a couple of milliseconds, so even a zero knob ends with a short fade
rather than a step. A zero attack jumps straight to full level.


State Machine
-------------

    ┌──────┐ start  ┌────────┐ frames=0 ┌───────┐ frames=0 ┌─────────┐
    │ Idle │ ─────→ │ Attack │ ───────→ │ Decay │ ───────→ │ Sustain │
    └──────┘        └────────┘          └───────┘          └─────────┘
        ↑               │ note_off          │ note_off          │ note_off
        │               ↓                   ↓                   ↓
        │           ┌───────────────────────────────────────────────┐
        └───────────│                    Release                    │
        frames=0    └───────────────────────────────────────────────┘

`advance` is called by the scheduler when a segment's frames run out; the
state never changes stage on its own inside `tick`.
*/

/// The current stage of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Per-voice envelope progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeState {
    pub running: bool,
    pub stage: EnvelopeStage,
    pub phase: f32,
    pub increment: f32,
    pub value: f32,
    pub c1: f32,
    pub c0: f32,
    pub frames: u32,
}

impl Default for EnvelopeState {
    fn default() -> Self {
        Self {
            running: false,
            stage: EnvelopeStage::Idle,
            phase: 0.0,
            increment: 0.0,
            value: 0.0,
            c1: 1.0,
            c0: 0.0,
            frames: 0,
        }
    }
}

impl EnvelopeState {
    /// Advance one frame along the segment and return the new value. Outside
    /// a running segment the held value is returned unchanged.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        if self.running && self.frames > 0 {
            self.phase += self.increment;
            self.frames -= 1;
            if self.frames == 0 {
                self.phase = 1.0;
            }
            self.value = self.c1 * self.phase * (2.0 - self.phase) + self.c0;
        }
        self.value
    }

    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    fn begin_segment(&mut self, frames: u32, c1: f32, c0: f32) {
        self.running = true;
        self.phase = 0.0;
        self.frames = frames;
        self.increment = if frames > 0 { 1.0 / frames as f32 } else { 0.0 };
        self.c1 = c1;
        self.c0 = c0;
    }
}

/// Parameter slots holding one envelope's stage knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeParams {
    pub attack: ParamIndex,
    pub decay: ParamIndex,
    pub sustain: ParamIndex,
    pub release: ParamIndex,
}

impl EnvelopeParams {
    pub const DCA: Self = Self {
        attack: ParamIndex::Dca1Attack,
        decay: ParamIndex::Dca1Decay,
        sustain: ParamIndex::Dca1Sustain,
        release: ParamIndex::Dca1Release,
    };

    pub const DCF: Self = Self {
        attack: ParamIndex::Dcf1Attack,
        decay: ParamIndex::Dcf1Decay,
        sustain: ParamIndex::Dcf1Sustain,
        release: ParamIndex::Dcf1Release,
    };

    pub const LFO: Self = Self {
        attack: ParamIndex::Lfo1Attack,
        decay: ParamIndex::Lfo1Decay,
        sustain: ParamIndex::Lfo1Sustain,
        release: ParamIndex::Lfo1Release,
    };
}

/// Shared envelope policy: which knobs to read and the frame bounds.
#[derive(Debug, Clone)]
pub struct Envelope {
    params: EnvelopeParams,
    min_frames: u32,
    max_frames: u32,
}

impl Envelope {
    pub fn new(params: EnvelopeParams) -> Self {
        Self {
            params,
            min_frames: 1,
            max_frames: 1,
        }
    }

    pub fn set_frame_range(&mut self, min_frames: u32, max_frames: u32) {
        self.min_frames = min_frames.max(1);
        self.max_frames = max_frames.max(self.min_frames);
    }

    pub fn min_frames(&self) -> u32 {
        self.min_frames
    }

    pub fn max_frames(&self) -> u32 {
        self.max_frames
    }

    fn stage_frames(&self, knob: f32) -> u32 {
        let knob = knob.clamp(0.0, 1.0);
        (knob * knob * self.max_frames as f32).round() as u32
    }

    /// Begin the attack segment.
    pub fn start(&self, state: &mut EnvelopeState, params: &Params) {
        state.stage = EnvelopeStage::Attack;
        let frames = self.stage_frames(params.value(self.params.attack));
        state.begin_segment(frames, 1.0, 0.0);
        state.value = if frames == 0 { 1.0 } else { 0.0 };
    }

    /// Move to the next stage once the current segment has run out.
    pub fn advance(&self, state: &mut EnvelopeState, params: &Params) {
        match state.stage {
            EnvelopeStage::Attack => {
                state.stage = EnvelopeStage::Decay;
                let frames = self
                    .stage_frames(params.value(self.params.decay))
                    .max(self.min_frames);
                let sustain = params.value(self.params.sustain);
                state.begin_segment(frames, sustain - state.value, state.value);
            }
            EnvelopeStage::Decay => {
                state.stage = EnvelopeStage::Sustain;
                state.running = false;
                state.c1 = 0.0;
                state.c0 = state.value;
            }
            EnvelopeStage::Release => {
                state.stage = EnvelopeStage::Idle;
                state.running = false;
                state.frames = 0;
                state.value = 0.0;
                state.c1 = 0.0;
                state.c0 = 0.0;
            }
            EnvelopeStage::Idle | EnvelopeStage::Sustain => {}
        }
    }

    /// Enter release from wherever the envelope currently is.
    pub fn note_off(&self, state: &mut EnvelopeState, params: &Params) {
        let frames = self
            .stage_frames(params.value(self.params.release))
            .max(self.min_frames);
        self.release_over(state, frames);
    }

    /// Enter release over the shortest allowed fade.
    pub fn note_off_fast(&self, state: &mut EnvelopeState) {
        self.release_over(state, self.min_frames);
    }

    fn release_over(&self, state: &mut EnvelopeState, frames: u32) {
        state.stage = EnvelopeStage::Release;
        let value = state.value;
        state.begin_segment(frames, -value, value);
    }
}
