//! Parameter table and smoothed parameter slots.
//!
//! Every controllable value lives in one [`Params`] table indexed by
//! [`ParamIndex`]. A slot can be driven two ways:
//!
//!   - directly, through `set_value` on the audio thread (or before it starts)
//!   - through a shared [`ParamPort`], a lock-free cell the host writes from any
//!     thread; the engine samples it once per block and only reacts to changes
//!     larger than `PORT_EPSILON`
//!
//! Smoothed slots glide to new values over `RAMP_LENGTH` frames; the rest snap.

use std::{
    ops::{Index, IndexMut},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::ramp::Ramp;

const PORT_EPSILON: f32 = 0.001;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamIndex {
    Gen1Sample,
    Gen1Reverse,
    Gen1Loop,
    Gen1Octave,
    Gen1Tuning,
    Gen1Glide,
    Gen1Envtime,
    Dcf1Cutoff,
    Dcf1Reso,
    Dcf1Type,
    Dcf1Slope,
    Dcf1Envelope,
    Dcf1Attack,
    Dcf1Decay,
    Dcf1Sustain,
    Dcf1Release,
    Lfo1Shape,
    Lfo1Width,
    Lfo1Bpm,
    Lfo1Rate,
    Lfo1Sync,
    Lfo1Sweep,
    Lfo1Pitch,
    Lfo1Cutoff,
    Lfo1Reso,
    Lfo1Panning,
    Lfo1Volume,
    Lfo1Attack,
    Lfo1Decay,
    Lfo1Sustain,
    Lfo1Release,
    Dca1Volume,
    Dca1Attack,
    Dca1Decay,
    Dca1Sustain,
    Dca1Release,
    Out1Width,
    Out1Panning,
    Out1Fxsend,
    Out1Volume,
    Def1Pitchbend,
    Def1Modwheel,
    Def1Pressure,
    Def1Velocity,
    Def1Channel,
    Def1Mono,
    Dyn1Limiter,
}

impl ParamIndex {
    pub const COUNT: usize = 47;

    pub const ALL: [ParamIndex; Self::COUNT] = [
        Self::Gen1Sample,
        Self::Gen1Reverse,
        Self::Gen1Loop,
        Self::Gen1Octave,
        Self::Gen1Tuning,
        Self::Gen1Glide,
        Self::Gen1Envtime,
        Self::Dcf1Cutoff,
        Self::Dcf1Reso,
        Self::Dcf1Type,
        Self::Dcf1Slope,
        Self::Dcf1Envelope,
        Self::Dcf1Attack,
        Self::Dcf1Decay,
        Self::Dcf1Sustain,
        Self::Dcf1Release,
        Self::Lfo1Shape,
        Self::Lfo1Width,
        Self::Lfo1Bpm,
        Self::Lfo1Rate,
        Self::Lfo1Sync,
        Self::Lfo1Sweep,
        Self::Lfo1Pitch,
        Self::Lfo1Cutoff,
        Self::Lfo1Reso,
        Self::Lfo1Panning,
        Self::Lfo1Volume,
        Self::Lfo1Attack,
        Self::Lfo1Decay,
        Self::Lfo1Sustain,
        Self::Lfo1Release,
        Self::Dca1Volume,
        Self::Dca1Attack,
        Self::Dca1Decay,
        Self::Dca1Sustain,
        Self::Dca1Release,
        Self::Out1Width,
        Self::Out1Panning,
        Self::Out1Fxsend,
        Self::Out1Volume,
        Self::Def1Pitchbend,
        Self::Def1Modwheel,
        Self::Def1Pressure,
        Self::Def1Velocity,
        Self::Def1Channel,
        Self::Def1Mono,
        Self::Dyn1Limiter,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gen1Sample => "GEN1_SAMPLE",
            Self::Gen1Reverse => "GEN1_REVERSE",
            Self::Gen1Loop => "GEN1_LOOP",
            Self::Gen1Octave => "GEN1_OCTAVE",
            Self::Gen1Tuning => "GEN1_TUNING",
            Self::Gen1Glide => "GEN1_GLIDE",
            Self::Gen1Envtime => "GEN1_ENVTIME",
            Self::Dcf1Cutoff => "DCF1_CUTOFF",
            Self::Dcf1Reso => "DCF1_RESO",
            Self::Dcf1Type => "DCF1_TYPE",
            Self::Dcf1Slope => "DCF1_SLOPE",
            Self::Dcf1Envelope => "DCF1_ENVELOPE",
            Self::Dcf1Attack => "DCF1_ATTACK",
            Self::Dcf1Decay => "DCF1_DECAY",
            Self::Dcf1Sustain => "DCF1_SUSTAIN",
            Self::Dcf1Release => "DCF1_RELEASE",
            Self::Lfo1Shape => "LFO1_SHAPE",
            Self::Lfo1Width => "LFO1_WIDTH",
            Self::Lfo1Bpm => "LFO1_BPM",
            Self::Lfo1Rate => "LFO1_RATE",
            Self::Lfo1Sync => "LFO1_SYNC",
            Self::Lfo1Sweep => "LFO1_SWEEP",
            Self::Lfo1Pitch => "LFO1_PITCH",
            Self::Lfo1Cutoff => "LFO1_CUTOFF",
            Self::Lfo1Reso => "LFO1_RESO",
            Self::Lfo1Panning => "LFO1_PANNING",
            Self::Lfo1Volume => "LFO1_VOLUME",
            Self::Lfo1Attack => "LFO1_ATTACK",
            Self::Lfo1Decay => "LFO1_DECAY",
            Self::Lfo1Sustain => "LFO1_SUSTAIN",
            Self::Lfo1Release => "LFO1_RELEASE",
            Self::Dca1Volume => "DCA1_VOLUME",
            Self::Dca1Attack => "DCA1_ATTACK",
            Self::Dca1Decay => "DCA1_DECAY",
            Self::Dca1Sustain => "DCA1_SUSTAIN",
            Self::Dca1Release => "DCA1_RELEASE",
            Self::Out1Width => "OUT1_WIDTH",
            Self::Out1Panning => "OUT1_PANNING",
            Self::Out1Fxsend => "OUT1_FXSEND",
            Self::Out1Volume => "OUT1_VOLUME",
            Self::Def1Pitchbend => "DEF1_PITCHBEND",
            Self::Def1Modwheel => "DEF1_MODWHEEL",
            Self::Def1Pressure => "DEF1_PRESSURE",
            Self::Def1Velocity => "DEF1_VELOCITY",
            Self::Def1Channel => "DEF1_CHANNEL",
            Self::Def1Mono => "DEF1_MONO",
            Self::Dyn1Limiter => "DYN1_LIMITER",
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            Self::Gen1Sample => 60.0,
            Self::Gen1Envtime => 0.5,
            Self::Dcf1Cutoff => 1.0,
            Self::Dcf1Envelope => 1.0,
            Self::Dcf1Decay => 0.2,
            Self::Dcf1Sustain => 0.5,
            Self::Dcf1Release => 0.5,
            Self::Lfo1Shape => 1.0,
            Self::Lfo1Width => 1.0,
            Self::Lfo1Bpm => 180.0,
            Self::Lfo1Rate => 0.5,
            Self::Lfo1Decay => 0.1,
            Self::Lfo1Sustain => 1.0,
            Self::Lfo1Release => 0.5,
            Self::Dca1Volume => 0.5,
            Self::Dca1Decay => 0.1,
            Self::Dca1Sustain => 1.0,
            Self::Dca1Release => 0.1,
            Self::Out1Fxsend => 1.0,
            Self::Out1Volume => 0.5,
            Self::Def1Pitchbend => 0.2,
            Self::Def1Modwheel => 0.2,
            Self::Def1Pressure => 0.2,
            Self::Def1Velocity => 0.2,
            Self::Dyn1Limiter => 1.0,
            _ => 0.0,
        }
    }

    /// Continuous controls that glide rather than snap.
    pub fn is_smoothed(self) -> bool {
        matches!(
            self,
            Self::Dcf1Cutoff
                | Self::Dcf1Reso
                | Self::Dcf1Envelope
                | Self::Lfo1Bpm
                | Self::Lfo1Rate
                | Self::Lfo1Sweep
                | Self::Lfo1Pitch
                | Self::Lfo1Cutoff
                | Self::Lfo1Reso
                | Self::Lfo1Panning
                | Self::Lfo1Volume
                | Self::Dca1Volume
                | Self::Out1Width
                | Self::Out1Panning
                | Self::Out1Fxsend
                | Self::Out1Volume
        )
    }
}

/// Lock-free host-side handle onto one parameter slot.
#[derive(Debug, Clone)]
pub struct ParamPort(Arc<AtomicU32>);

impl ParamPort {
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub struct SmoothedParam {
    port: Option<ParamPort>,
    port_value: f32,
    raw_value: f32,
    smoothed: bool,
    ramp: Ramp,
}

impl SmoothedParam {
    pub fn new(value: f32, smoothed: bool) -> Self {
        Self {
            port: None,
            port_value: value,
            raw_value: value,
            smoothed,
            ramp: Ramp::new(value),
        }
    }

    pub fn set_value(&mut self, value: f32) {
        self.raw_value = value;
        if self.smoothed {
            self.ramp.set_target(value);
        } else {
            self.ramp.reset(value);
        }
        if let Some(port) = &self.port {
            self.port_value = port.get();
        }
    }

    /// Immediate (unsmoothed) value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.raw_value
    }

    /// Smoothed value `offset` frames into the current block.
    #[inline]
    pub fn ramp_value(&self, offset: u32) -> f32 {
        self.ramp.value_at(offset)
    }

    pub fn tick(&mut self, frames: u32) {
        self.ramp.process(frames);
    }

    /// Pull a pending host write from the port, if one moved far enough.
    pub fn sync(&mut self) {
        let Some(port) = &self.port else {
            return;
        };
        let value = port.get();
        if (value - self.port_value).abs() > PORT_EPSILON {
            self.set_value(value);
        }
    }

    /// Shared port for this slot, created on first request.
    pub fn port(&mut self) -> ParamPort {
        match &self.port {
            Some(port) => port.clone(),
            None => {
                let port = ParamPort::new(self.raw_value);
                self.port_value = self.raw_value;
                self.port = Some(port.clone());
                port
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Params {
    slots: [SmoothedParam; ParamIndex::COUNT],
}

impl Default for Params {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|i| {
                let index = ParamIndex::ALL[i];
                SmoothedParam::new(index.default_value(), index.is_smoothed())
            }),
        }
    }
}

impl Params {
    #[inline]
    pub fn value(&self, index: ParamIndex) -> f32 {
        self.slots[index.index()].value()
    }

    pub fn set_value(&mut self, index: ParamIndex, value: f32) {
        self.slots[index.index()].set_value(value);
    }

    pub fn sync(&mut self) {
        for slot in &mut self.slots {
            slot.sync();
        }
    }

    pub fn tick(&mut self, frames: u32) {
        for slot in &mut self.slots {
            slot.tick(frames);
        }
    }
}

impl Index<ParamIndex> for Params {
    type Output = SmoothedParam;

    fn index(&self, index: ParamIndex) -> &Self::Output {
        &self.slots[index.index()]
    }
}

impl IndexMut<ParamIndex> for Params {
    fn index_mut(&mut self, index: ParamIndex) -> &mut Self::Output {
        &mut self.slots[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RAMP_LENGTH;

    #[test]
    fn table_order_matches_discriminants() {
        for (i, index) in ParamIndex::ALL.iter().enumerate() {
            assert_eq!(index.index(), i, "{} out of order", index.name());
            assert_eq!(ParamIndex::from_index(i), Some(*index));
        }
        assert_eq!(ParamIndex::from_index(ParamIndex::COUNT), None);
    }

    #[test]
    fn defaults_are_loaded() {
        let params = Params::default();
        assert_eq!(params.value(ParamIndex::Gen1Sample), 60.0);
        assert_eq!(params.value(ParamIndex::Dca1Sustain), 1.0);
        assert_eq!(params.value(ParamIndex::Dyn1Limiter), 1.0);
        assert_eq!(params.value(ParamIndex::Def1Mono), 0.0);
    }

    #[test]
    fn smoothed_param_ramps_toward_new_value() {
        let mut param = SmoothedParam::new(0.0, true);
        param.set_value(1.0);

        assert_eq!(param.value(), 1.0);
        assert_eq!(param.ramp_value(0), 0.0);

        param.tick(RAMP_LENGTH);
        assert_eq!(param.ramp_value(0), 1.0);
    }

    #[test]
    fn plain_param_snaps() {
        let mut param = SmoothedParam::new(0.0, false);
        param.set_value(0.7);
        assert_eq!(param.ramp_value(0), 0.7);
    }

    #[test]
    fn port_write_is_picked_up_on_sync() {
        let mut params = Params::default();
        let port = params[ParamIndex::Dcf1Cutoff].port();

        port.set(0.25);
        params.sync();
        assert_eq!(params.value(ParamIndex::Dcf1Cutoff), 0.25);
    }

    #[test]
    fn tiny_port_moves_are_ignored() {
        let mut params = Params::default();
        let port = params[ParamIndex::Out1Volume].port();

        port.set(0.5 + PORT_EPSILON * 0.5);
        params.sync();
        assert_eq!(params.value(ParamIndex::Out1Volume), 0.5);
    }

    #[test]
    fn direct_set_is_not_reverted_by_stale_port() {
        let mut params = Params::default();
        let _port = params[ParamIndex::Dca1Volume].port();

        params.set_value(ParamIndex::Dca1Volume, 0.9);
        params.sync();
        assert_eq!(params.value(ParamIndex::Dca1Volume), 0.9);
    }
}
