// Transcript sources - the recognized-text side of the speech recognizer

use super::ListenerError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One recognized chunk of speech
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptChunk {
    /// Recognized text; may be empty when no speech was recognized
    pub text: String,
    /// Whether the recognizer considers this a final result
    pub is_final: bool,
}

impl TranscriptChunk {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_result(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// A continuous stream of transcript chunks
///
/// `None` means the stream ended normally. `Some(Err(_))` is a terminal
/// stream failure.
#[async_trait]
pub trait TranscriptSource: Send {
    async fn next_chunk(&mut self) -> Option<Result<TranscriptChunk, ListenerError>>;
}

/// Transcript source fed through an mpsc channel
///
/// Lets push-style recognizers hand chunks to a listener session.
pub struct ChannelTranscriptSource {
    rx: mpsc::Receiver<Result<TranscriptChunk, ListenerError>>,
}

impl ChannelTranscriptSource {
    /// Create a source and the sender that feeds it
    pub fn channel(
        buffer: usize,
    ) -> (mpsc::Sender<Result<TranscriptChunk, ListenerError>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

#[async_trait]
impl TranscriptSource for ChannelTranscriptSource {
    async fn next_chunk(&mut self) -> Option<Result<TranscriptChunk, ListenerError>> {
        self.rx.recv().await
    }
}
