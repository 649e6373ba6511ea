// Purpose - external interfaces, format conversions

pub mod control;
pub mod converter;
pub mod midi;

pub use control::{ControlEvent, ControlSink};
pub use midi::{MidiEvent, MidiEvents};
