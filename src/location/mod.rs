// Location module
// Single-shot, best-effort location fixes bounded by a timeout

mod provider;
mod resolver;

pub use provider::{FixedLocationProvider, LocationProvider, UnavailableLocationProvider};
pub use resolver::{LocationError, LocationFix, LocationResolver};
