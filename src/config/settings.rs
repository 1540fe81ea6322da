//! Settings document and loading.

use crate::dispatch::message::DEFAULT_MESSAGE_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Application directory name under the platform config/data dirs
pub const APP_DIR: &str = "comalert";

/// Errors raised while loading settings
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read or parsed
    #[error("Failed to load settings from {path}: {message}")]
    Load { path: String, message: String },
    /// A setting has an unusable value
    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// A configured coordinate used when no live location source exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Upper bound on a location lookup before the alert goes out without one
    pub location_timeout_ms: u64,
    /// Upper bound on a single SMS send
    pub send_timeout_ms: u64,
    /// Number of recent alert events kept for inspection
    pub history_capacity: usize,
    /// Text placed before the coordinates in every alert message
    pub message_prefix: String,
    /// When set, trigger phrase and contacts are persisted here
    pub data_dir: Option<PathBuf>,
    pub fallback_location: Option<FallbackLocation>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location_timeout_ms: 5_000,
            send_timeout_ms: 30_000,
            history_capacity: 50,
            message_prefix: DEFAULT_MESSAGE_PREFIX.to_string(),
            data_dir: None,
            fallback_location: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            crate::info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let load_err = |message: String| SettingsError::Load {
            path: path.display().to_string(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?;
        settings.validate()?;

        crate::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.location_timeout_ms == 0 {
            return Err(SettingsError::Invalid {
                key: "locationTimeoutMs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.send_timeout_ms == 0 {
            return Err(SettingsError::Invalid {
                key: "sendTimeoutMs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.history_capacity == 0 {
            return Err(SettingsError::Invalid {
                key: "historyCapacity",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.message_prefix.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "messagePrefix",
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Persistence file for the trigger phrase, if a data directory is set
    pub fn trigger_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("trigger.json"))
    }

    /// Persistence file for contacts, if a data directory is set
    pub fn contacts_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("contacts.json"))
    }
}

/// Default settings location: `<config dir>/comalert/settings.json`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
