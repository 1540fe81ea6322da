// Listener session - evaluates each transcript chunk against the trigger phrase
//
// Every matching chunk produces one TriggerMatch; there is no de-duplication
// across chunks. A stream failure ends the session and is returned to the
// caller, who decides whether to start a new one.

use super::phrase::contains_phrase;
use super::TranscriptSource;
use crate::trigger::{TriggerPhrase, TriggerStore};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Errors that end a listener session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListenerError {
    /// The underlying transcript stream failed; the session must be restarted
    #[error("Transcript stream failed: {0}")]
    StreamFailed(String),
    /// Nobody is receiving matches anymore
    #[error("Match receiver closed")]
    MatchReceiverClosed,
}

/// A transcript chunk that contained the trigger phrase
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerMatch {
    /// The phrase that was active when the chunk was evaluated
    pub phrase: TriggerPhrase,
    /// The chunk text as recognized
    pub transcript: String,
    /// Whether the chunk was a final recognition result
    pub is_final: bool,
    pub detected_at: DateTime<Utc>,
}

/// Counters for a finished session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub chunks: u64,
    pub matches: u64,
}

/// Matches transcript chunks against the active trigger phrase
pub struct ListenerSession {
    trigger: Arc<RwLock<TriggerStore>>,
    match_tx: mpsc::UnboundedSender<TriggerMatch>,
}

impl ListenerSession {
    /// Create a session reading the phrase from `trigger` and sending matches on `match_tx`
    ///
    /// The phrase is read per chunk, so edits take effect on the next chunk.
    pub fn new(
        trigger: Arc<RwLock<TriggerStore>>,
        match_tx: mpsc::UnboundedSender<TriggerMatch>,
    ) -> Self {
        Self { trigger, match_tx }
    }

    /// Evaluate one chunk, returning the match if it contains the trigger phrase
    pub fn evaluate(&self, text: &str, is_final: bool) -> Option<TriggerMatch> {
        let phrase = self.trigger.read().current().cloned()?;

        if !contains_phrase(text, &phrase) {
            return None;
        }

        Some(TriggerMatch {
            phrase,
            transcript: text.to_string(),
            is_final,
            detected_at: Utc::now(),
        })
    }

    /// Consume `source` until it ends or fails
    ///
    /// Matches go out on an unbounded channel so the read loop never waits on
    /// the alert pipeline.
    pub async fn run<S: TranscriptSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<ListenerStats, ListenerError> {
        crate::info!("[listener] Listening for trigger phrase");
        let mut stats = ListenerStats::default();

        while let Some(next) = source.next_chunk().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(e) => {
                    crate::error!(
                        "[listener] Stream failed after {} chunks: {}",
                        stats.chunks,
                        e
                    );
                    return Err(e);
                }
            };
            stats.chunks += 1;

            if self.trigger.read().current().is_none() {
                crate::trace!("[listener] No trigger phrase set, ignoring chunk");
                continue;
            }

            let Some(found) = self.evaluate(&chunk.text, chunk.is_final) else {
                continue;
            };

            crate::info!(
                "[listener] Trigger phrase \"{}\" detected (final={})",
                found.phrase,
                found.is_final
            );
            stats.matches += 1;

            if self.match_tx.send(found).is_err() {
                crate::warn!("[listener] Match receiver dropped, ending session");
                return Err(ListenerError::MatchReceiverClosed);
            }
        }

        crate::info!(
            "[listener] Transcript stream ended ({} chunks, {} matches)",
            stats.chunks,
            stats.matches
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
