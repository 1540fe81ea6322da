//! Shared utilities for the comalert backend.
//!
//! - `persist`: atomic JSON persistence used by the trigger and contact stores

mod persist;

pub use persist::{load_json, save_json_atomic, PersistError};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
