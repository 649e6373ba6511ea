//! Raw MIDI byte decoding.
//!
//! The engine receives MIDI as a flat byte buffer of complete channel
//! messages (no running status). [`MidiEvents`] walks such a buffer:
//!
//!   - system messages (status `0xF0`–`0xFF`) are skipped byte by byte
//!   - program change and channel pressure take one data byte
//!   - everything else takes two
//!   - a message cut short by the end of the buffer ends decoding
//!   - bytes that are not a known status still consume two data bytes
//!
//! Channels are reported 1-based.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_PRESSURE: u8 = 0xa0;
pub const CONTROL_CHANGE: u8 = 0xb0;
pub const PROGRAM_CHANGE: u8 = 0xc0;
pub const CHANNEL_PRESSURE: u8 = 0xd0;
pub const PITCH_BEND: u8 = 0xe0;
pub const SYSTEM: u8 = 0xf0;

pub const CC_BANK_SELECT_MSB: u8 = 0x00;
pub const CC_MODWHEEL: u8 = 0x01;
pub const CC_VOLUME: u8 = 0x07;
pub const CC_PANNING: u8 = 0x0a;
pub const CC_BANK_SELECT_LSB: u8 = 0x20;
pub const CC_SUSTAIN: u8 = 0x40;
pub const CC_ALL_SOUND_OFF: u8 = 0x78;
pub const CC_ALL_CONTROLLERS_OFF: u8 = 0x79;
pub const CC_ALL_NOTES_OFF: u8 = 0x7b;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    PolyPressure { channel: u8, key: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// Centered 14-bit value in `-8192..=8191`.
    PitchBend { channel: u8, value: i16 },
}

impl MidiEvent {
    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::PolyPressure { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelPressure { channel, .. }
            | Self::PitchBend { channel, .. } => channel,
        }
    }

    /// Encode as raw bytes, returning the message length.
    pub fn to_bytes(&self) -> ([u8; 3], usize) {
        let status = |kind: u8, channel: u8| kind | (channel.saturating_sub(1) & 0x0f);
        match *self {
            Self::NoteOn { channel, key, velocity } => {
                ([status(NOTE_ON, channel), key, velocity], 3)
            }
            Self::NoteOff { channel, key, velocity } => {
                ([status(NOTE_OFF, channel), key, velocity], 3)
            }
            Self::PolyPressure { channel, key, pressure } => {
                ([status(POLY_PRESSURE, channel), key, pressure], 3)
            }
            Self::ControlChange { channel, controller, value } => {
                ([status(CONTROL_CHANGE, channel), controller, value], 3)
            }
            Self::ProgramChange { channel, program } => {
                ([status(PROGRAM_CHANGE, channel), program, 0], 2)
            }
            Self::ChannelPressure { channel, pressure } => {
                ([status(CHANNEL_PRESSURE, channel), pressure, 0], 2)
            }
            Self::PitchBend { channel, value } => {
                let raw = (i32::from(value) + 0x2000).clamp(0, 0x3fff) as u16;
                (
                    [status(PITCH_BEND, channel), (raw & 0x7f) as u8, (raw >> 7) as u8],
                    3,
                )
            }
        }
    }
}

/// Iterator decoding complete messages from a byte buffer.
pub struct MidiEvents<'a> {
    bytes: std::slice::Iter<'a, u8>,
}

impl<'a> MidiEvents<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { bytes: data.iter() }
    }
}

impl Iterator for MidiEvents<'_> {
    type Item = MidiEvent;

    fn next(&mut self) -> Option<MidiEvent> {
        loop {
            let status_byte = *self.bytes.next()?;
            let channel = (status_byte & 0x0f) + 1;
            let status = status_byte & 0xf0;

            if status == SYSTEM {
                continue;
            }

            let data1 = *self.bytes.next()? & 0x7f;
            match status {
                PROGRAM_CHANGE => {
                    return Some(MidiEvent::ProgramChange { channel, program: data1 })
                }
                CHANNEL_PRESSURE => {
                    return Some(MidiEvent::ChannelPressure { channel, pressure: data1 })
                }
                _ => {}
            }

            let data2 = *self.bytes.next()? & 0x7f;
            let event = match status {
                NOTE_ON if data2 > 0 => MidiEvent::NoteOn {
                    channel,
                    key: data1,
                    velocity: data2,
                },
                NOTE_ON | NOTE_OFF => MidiEvent::NoteOff {
                    channel,
                    key: data1,
                    velocity: data2,
                },
                POLY_PRESSURE => MidiEvent::PolyPressure {
                    channel,
                    key: data1,
                    pressure: data2,
                },
                CONTROL_CHANGE => MidiEvent::ControlChange {
                    channel,
                    controller: data1,
                    value: data2,
                },
                PITCH_BEND => MidiEvent::PitchBend {
                    channel,
                    value: (i16::from(data1) | (i16::from(data2) << 7)) - 0x2000,
                },
                _ => continue,
            };
            return Some(event);
        }
    }
}
