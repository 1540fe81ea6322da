// Alert events for observers (UI, logs)
// Defines event payloads and emission trait for testability

use crate::alert::{AlertId, AlertState, DeliveryStatus, DeliverySummary};
use serde::Serialize;

/// Event names as constants for consistency
pub mod event_names {
    pub const ALERT_CREATED: &str = "alert_created";
    pub const ALERT_STATE_CHANGED: &str = "alert_state_changed";
    pub const ALERT_DELIVERY: &str = "alert_delivery";
    pub const ALERT_COMPLETED: &str = "alert_completed";
}

/// Payload for alert_created event
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertCreatedPayload {
    pub alert_id: AlertId,
    /// The trigger phrase that fired
    pub trigger_phrase: String,
    /// Number of recipients captured for this alert
    pub recipient_count: usize,
    /// Events already waiting ahead of this one
    pub queue_position: usize,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

/// Payload for alert_state_changed event
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertStateChangedPayload {
    pub alert_id: AlertId,
    pub state: AlertState,
    pub timestamp: String,
}

/// Payload for alert_delivery event, one per recipient outcome
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertDeliveryPayload {
    pub alert_id: AlertId,
    pub contact_id: String,
    pub contact_name: String,
    pub status: DeliveryStatus,
}

/// Payload for alert_completed event
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertCompletedPayload {
    pub alert_id: AlertId,
    /// Whether a location fix was included in the message
    pub has_location: bool,
    pub cancelled: bool,
    pub summary: DeliverySummary,
    pub timestamp: String,
}

/// Trait for emitting alert events
/// Allows mocking in tests while using a logging emitter in the binary
pub trait AlertEventEmitter: Send + Sync {
    fn emit_alert_created(&self, payload: AlertCreatedPayload);

    fn emit_alert_state_changed(&self, payload: AlertStateChangedPayload);

    fn emit_alert_delivery(&self, payload: AlertDeliveryPayload);

    fn emit_alert_completed(&self, payload: AlertCompletedPayload);
}

/// Emitter that writes events to the log as JSON
pub struct LogEventEmitter;

impl LogEventEmitter {
    fn log<P: Serialize>(name: &str, payload: &P) {
        match serde_json::to_string(payload) {
            Ok(json) => crate::info!("[event] {} {}", name, json),
            Err(e) => crate::warn!("[event] Failed to serialize {} payload: {}", name, e),
        }
    }
}

impl AlertEventEmitter for LogEventEmitter {
    fn emit_alert_created(&self, payload: AlertCreatedPayload) {
        Self::log(event_names::ALERT_CREATED, &payload);
    }

    fn emit_alert_state_changed(&self, payload: AlertStateChangedPayload) {
        Self::log(event_names::ALERT_STATE_CHANGED, &payload);
    }

    fn emit_alert_delivery(&self, payload: AlertDeliveryPayload) {
        Self::log(event_names::ALERT_DELIVERY, &payload);
    }

    fn emit_alert_completed(&self, payload: AlertCompletedPayload) {
        Self::log(event_names::ALERT_COMPLETED, &payload);
    }
}

/// Get the current timestamp in ISO 8601 format
pub fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
#[path = "events_test.rs"]
pub(crate) mod tests;
