/// Frequency in Hz of a (possibly fractional) MIDI note number.
///
/// Anchored at A0 = 27.5 Hz rather than A4 so low notes stay exact.
#[inline]
pub fn note_to_freq(note: f32) -> f32 {
    13.75 * ((note - 9.0) / 12.0).exp2()
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    note_to_freq(note as f32)
}

/// Centered pitch-bend value to [-1, 1).
#[inline]
pub fn pitch_bend_unit(value: i16) -> f32 {
    value as f32 / 8192.0
}

/// 7-bit controller value to [0, 1].
#[inline]
pub fn cc_unit(value: u8) -> f32 {
    value as f32 / 127.0
}

/// 7-bit controller value centered on 64, to [-1, 1).
#[inline]
pub fn cc_bipolar(value: u8) -> f32 {
    (value as f32 - 64.0) / 64.0
}
