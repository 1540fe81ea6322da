//! Application settings.
//!
//! Settings live in a JSON file (`settings.json` under the platform config
//! directory by default). Every field has a default, so a missing file or a
//! partial file is valid.

mod settings;

pub use settings::{default_settings_path, FallbackLocation, Settings, SettingsError};
