// Location providers

use super::{LocationError, LocationFix};
use async_trait::async_trait;
use chrono::Utc;

/// A device location capability answering single-shot requests
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Fetch the best available fix
    async fn current_fix(&self) -> Result<LocationFix, LocationError>;
}

/// Provider that always reports the same coordinate, stamped with the request time
///
/// Used when no positioning hardware is available but the user has configured
/// a known location (home address, for example).
pub struct FixedLocationProvider {
    latitude: f64,
    longitude: f64,
}

impl FixedLocationProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        LocationFix::new(self.latitude, self.longitude, Utc::now())
    }
}

/// Provider for devices without any location source
pub struct UnavailableLocationProvider;

#[async_trait]
impl LocationProvider for UnavailableLocationProvider {
    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        Err(LocationError::Unavailable(
            "no location provider configured".to_string(),
        ))
    }
}
