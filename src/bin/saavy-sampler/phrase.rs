//! The demo phrase: a short arpeggio with a held chord at the end.

use saavy_sampler::io::midi::MidiEvent;

/// One MIDI message due at `beat`.
#[derive(Debug, Clone, Copy)]
pub struct PhraseEvent {
    pub beat: f32,
    pub event: MidiEvent,
}

const NOTES: [(f32, u8, f32); 7] = [
    (0.0, 60, 0.9),
    (1.0, 64, 0.9),
    (2.0, 67, 0.9),
    (3.0, 72, 0.9),
    (4.0, 60, 3.5),
    (4.0, 64, 3.5),
    (4.0, 67, 3.5),
];

/// Events sorted by beat.
pub fn events() -> Vec<PhraseEvent> {
    let mut events: Vec<_> = NOTES
        .iter()
        .flat_map(|&(beat, key, length)| {
            [
                PhraseEvent {
                    beat,
                    event: MidiEvent::NoteOn {
                        channel: 1,
                        key,
                        velocity: 100,
                    },
                },
                PhraseEvent {
                    beat: beat + length,
                    event: MidiEvent::NoteOff {
                        channel: 1,
                        key,
                        velocity: 0,
                    },
                },
            ]
        })
        .collect();
    events.sort_by(|a, b| a.beat.total_cmp(&b.beat));
    events
}

/// Length of the phrase in beats, release tail included.
pub fn length_beats() -> f32 {
    NOTES
        .iter()
        .map(|&(beat, _, length)| beat + length)
        .fold(0.0, f32::max)
        + 2.0
}
