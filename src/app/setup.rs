//! Application setup: settings, sign-in and session construction.

use crate::auth::{AuthSession, AuthState, LocalIdentityProvider};
use crate::config::{default_settings_path, Settings, SettingsError};
use crate::dispatch::LogSmsTransport;
use crate::events::LogEventEmitter;
use crate::location::{FixedLocationProvider, LocationProvider, UnavailableLocationProvider};
use crate::session::{SafetySession, SessionError, SessionServices};
use std::path::PathBuf;
use std::sync::Arc;

/// Overrides the settings file location
pub const SETTINGS_ENV: &str = "COMALERT_SETTINGS";
pub const EMAIL_ENV: &str = "COMALERT_EMAIL";
pub const PASSWORD_ENV: &str = "COMALERT_PASSWORD";

/// Errors that stop the console application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Sign-in failed: {0} (set COMALERT_EMAIL and COMALERT_PASSWORD)")]
    SignIn(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Load settings from `$COMALERT_SETTINGS` or the platform config directory
pub fn load_settings() -> Result<Settings, AppError> {
    let path = std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .or_else(default_settings_path);

    let settings = match path {
        Some(path) => Settings::load(&path)?,
        None => {
            crate::warn!("No config directory available, using default settings");
            Settings::default()
        }
    };
    Ok(settings)
}

/// Sign in with the credentials in the environment, creating the account if needed
pub async fn sign_in() -> Result<AuthSession, AppError> {
    let email = std::env::var(EMAIL_ENV).unwrap_or_default();
    let password = std::env::var(PASSWORD_ENV).unwrap_or_default();
    let auth = AuthSession::new(Arc::new(LocalIdentityProvider::new()));

    if let AuthState::Authenticated = auth.login(&email, &password).await {
        return Ok(auth);
    }

    match auth.signup(&email, &password).await {
        AuthState::Authenticated => {
            crate::info!("Signed in as {}", email.trim());
            Ok(auth)
        }
        AuthState::Error(message) => Err(AppError::SignIn(message)),
        other => Err(AppError::SignIn(format!("unexpected state {:?}", other))),
    }
}

/// Start a session using the log transport and the configured location source
pub fn start_session(auth: &AuthSession, settings: &Settings) -> Result<SafetySession, AppError> {
    let location: Arc<dyn LocationProvider> = match settings.fallback_location {
        Some(fallback) => {
            crate::info!(
                "Using fixed location ({}, {})",
                fallback.latitude,
                fallback.longitude
            );
            Arc::new(FixedLocationProvider::new(
                fallback.latitude,
                fallback.longitude,
            ))
        }
        None => {
            crate::warn!("No location source configured, alerts will go out without a fix");
            Arc::new(UnavailableLocationProvider)
        }
    };

    let services = SessionServices {
        location,
        transport: Arc::new(LogSmsTransport),
        emitter: Arc::new(LogEventEmitter),
    };
    Ok(SafetySession::start(auth, settings, services)?)
}
