// Listener module for trigger phrase detection
// Consumes recognized transcript chunks and emits a match for every chunk
// that contains the active trigger phrase

pub mod phrase;
mod session;
mod source;

pub use session::{ListenerError, ListenerSession, ListenerStats, TriggerMatch};
pub use source::{ChannelTranscriptSource, TranscriptChunk, TranscriptSource};
