// Trigger store - the one active trigger phrase for a session
// Replaced wholesale on every edit, optionally persisted as JSON

use crate::util::{load_json, save_json_atomic, PersistError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A normalized trigger phrase
///
/// Always lower-case, trimmed, with internal whitespace collapsed to single
/// spaces. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerPhrase(String);

impl TriggerPhrase {
    /// Normalize raw user input into a trigger phrase
    pub fn parse(raw: &str) -> Result<Self, TriggerError> {
        let normalized = crate::listener::phrase::normalize(raw);
        if normalized.is_empty() {
            return Err(TriggerError::Empty);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TriggerPhrase {
    type Error = TriggerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TriggerPhrase> for String {
    fn from(phrase: TriggerPhrase) -> Self {
        phrase.0
    }
}

/// Errors for trigger phrase operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriggerError {
    /// Input was empty after normalization
    #[error("Trigger phrase cannot be empty")]
    Empty,
    /// Reading or writing the persisted phrase failed
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TriggerDocument {
    phrase: Option<TriggerPhrase>,
}

/// Store for the active trigger phrase
#[derive(Debug, Default)]
pub struct TriggerStore {
    current: Option<TriggerPhrase>,
    /// Persistence file; `None` keeps the phrase in memory only
    path: Option<PathBuf>,
}

impl TriggerStore {
    /// Create an in-memory store with no phrase set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store backed by `path`, loading any phrase already saved there
    pub fn with_path(path: PathBuf) -> Result<Self, TriggerError> {
        let document: TriggerDocument = load_json(&path)?.unwrap_or_default();
        if let Some(phrase) = &document.phrase {
            crate::info!("[trigger] Restored trigger phrase \"{}\"", phrase);
        }
        Ok(Self {
            current: document.phrase,
            path: Some(path),
        })
    }

    /// Replace the active phrase
    ///
    /// Invalid input leaves the previous phrase untouched.
    pub fn set(&mut self, raw: &str) -> Result<TriggerPhrase, TriggerError> {
        let phrase = TriggerPhrase::parse(raw)?;
        let previous = self.current.replace(phrase.clone());

        if let Err(e) = self.save() {
            self.current = previous;
            return Err(e);
        }

        crate::info!("[trigger] Trigger phrase set to \"{}\"", phrase);
        Ok(phrase)
    }

    /// The active phrase, if one has been set
    pub fn current(&self) -> Option<&TriggerPhrase> {
        self.current.as_ref()
    }

    fn save(&self) -> Result<(), TriggerError> {
        if let Some(path) = &self.path {
            let document = TriggerDocument {
                phrase: self.current.clone(),
            };
            save_json_atomic(path, &document)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
