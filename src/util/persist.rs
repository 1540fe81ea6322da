//! Atomic JSON persistence helpers.
//!
//! Stores that opt into durable storage write their whole document on every
//! mutation using the temp file + rename pattern, so a crash mid-write never
//! leaves a truncated file behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Errors raised while reading or writing a persisted document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PersistError {
    /// The file exists but could not be read or parsed
    #[error("Failed to load {path}: {message}")]
    Load { path: String, message: String },
    /// The document could not be written
    #[error("Failed to persist {path}: {message}")]
    Save { path: String, message: String },
}

/// Load a JSON document from `path`.
///
/// Returns `Ok(None)` when the file does not exist yet.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistError> {
    if !path.exists() {
        crate::debug!("[persist] No file at {:?}, starting empty", path);
        return Ok(None);
    }

    let load_err = |message: String| PersistError::Load {
        path: path.display().to_string(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
    let value = serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?;
    Ok(Some(value))
}

/// Write `value` as pretty JSON to `path` using temp file + rename.
pub fn save_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let save_err = |message: String| PersistError::Save {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| save_err(e.to_string()))?;
    let temp_path = path.with_extension("tmp");

    {
        let mut file = File::create(&temp_path)
            .map_err(|e| save_err(format!("Failed to create temp file: {}", e)))?;
        file.write_all(content.as_bytes())
            .map_err(|e| save_err(format!("Failed to write: {}", e)))?;
        file.sync_all()
            .map_err(|e| save_err(format!("Failed to sync: {}", e)))?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        save_err(format!("Failed to rename: {}", e))
    })?;

    crate::trace!("[persist] Wrote {:?}", path);
    Ok(())
}
