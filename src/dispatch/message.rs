// Alert message text

use crate::location::LocationFix;

/// Default text placed before the coordinates
pub const DEFAULT_MESSAGE_PREFIX: &str = "Emergency! My location is:";

/// Build the SMS body for an alert
///
/// Without a fix the message still goes out, saying the location is unknown.
pub fn format_alert_message(prefix: &str, fix: Option<&LocationFix>) -> String {
    match fix {
        Some(fix) => format!(
            "{} Latitude: {:.6}, Longitude: {:.6}",
            prefix, fix.latitude, fix.longitude
        ),
        None => format!("{} unavailable (no location fix)", prefix),
    }
}
