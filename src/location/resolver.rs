// Location resolver - bounds a provider request by a timeout
//
// A missing fix degrades the alert instead of blocking it, so both timeout
// and provider errors collapse to `None` in `resolve`.

use super::LocationProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A single resolved coordinate reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: DateTime<Utc>,
}

impl LocationFix {
    /// Create a fix, rejecting non-finite or out-of-range coordinates
    pub fn new(
        latitude: f64,
        longitude: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, LocationError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(LocationError::Unavailable(format!(
                "invalid coordinates ({}, {})",
                latitude, longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            captured_at,
        })
    }
}

/// Reasons a fix could not be obtained
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum LocationError {
    /// The provider did not answer within the timeout
    #[error("Location request timed out after {0}ms")]
    Timeout(u64),
    /// The provider answered without a usable fix
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Resolves one best-effort location fix per request
#[derive(Clone)]
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self { provider }
    }

    /// Request a fix, failing with `Timeout` if the provider takes longer than `timeout`
    pub async fn try_resolve(&self, timeout: Duration) -> Result<LocationFix, LocationError> {
        match tokio::time::timeout(timeout, self.provider.current_fix()).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout(timeout.as_millis() as u64)),
        }
    }

    /// Request a fix, returning `None` on timeout or provider error
    pub async fn resolve(&self, timeout: Duration) -> Option<LocationFix> {
        match self.try_resolve(timeout).await {
            Ok(fix) => Some(fix),
            Err(e) => {
                crate::warn!("[location] {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
