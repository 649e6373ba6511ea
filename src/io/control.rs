#[cfg(feature = "rtrb")]
use rtrb::Producer;

/// Controller traffic the engine does not consume itself, handed on to
/// whoever owns automation and program storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Controller { channel: u8, controller: u8, value: u8 },
    Program { channel: u8, bank: u16, program: u8 },
}

/// Receiver for forwarded controller events. Implementations must not block;
/// the engine calls `push` from the audio thread.
pub trait ControlSink: Send {
    /// Returns false when the event had to be dropped.
    fn push(&mut self, event: ControlEvent) -> bool;
}

#[cfg(feature = "rtrb")]
impl ControlSink for Producer<ControlEvent> {
    fn push(&mut self, event: ControlEvent) -> bool {
        Producer::push(self, event).is_ok()
    }
}
