//! Channel-wide MIDI controller state and the LFO-driven aux controls.

/// Continuous controllers shared by every voice on the channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiControls {
    /// Channel pressure, raw 0..1.
    pub pressure: f32,
    /// Frequency multiplier from the pitch wheel.
    pub pitchbend: f32,
    pub modwheel: f32,
    /// -1..1, centered.
    pub panning: f32,
    pub volume: f32,
    pub sustain: bool,
}

impl Default for MidiControls {
    fn default() -> Self {
        Self {
            pressure: 0.0,
            pitchbend: 1.0,
            modwheel: 0.0,
            panning: 0.0,
            volume: 1.0,
            sustain: false,
        }
    }
}

impl MidiControls {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Panning and volume offsets written by voice LFOs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxControls {
    pub panning: f32,
    pub volume: f32,
}

impl Default for AuxControls {
    fn default() -> Self {
        Self {
            panning: 0.0,
            volume: 1.0,
        }
    }
}

impl AuxControls {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
