// Purpose: Voice management, polyphony, MIDI handling
// This layer sits above the DSP primitives and drives every voice

pub mod controls;
pub mod engine;
pub mod params;
pub mod pool;
pub mod voice;

pub use engine::{SamplerEngine, SendEffect};
pub use params::{ParamIndex, ParamPort, Params};
pub use pool::{VoiceId, VoicePool};
