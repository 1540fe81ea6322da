// AlertEvent - one full cycle from detected trigger to delivery outcome

use crate::contacts::Contact;
use crate::listener::TriggerMatch;
use crate::location::{LocationError, LocationFix};
use crate::trigger::TriggerPhrase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

pub type AlertId = String;

/// Where an alert event is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertState {
    /// Created while another event was in flight
    Queued,
    AwaitingLocation,
    Dispatching,
    Complete,
}

/// Delivery outcome for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DeliveryStatus {
    Pending,
    /// Transport acknowledged the message
    Sent,
    Failed { reason: String },
    /// Cancelled before the transport acknowledged
    Cancelled,
}

impl DeliveryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}

/// Per-status recipient counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliverySummary {
    pub sent: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub pending: usize,
}

/// One alert from trigger detection to completed delivery
///
/// The recipient list is captured at creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub id: AlertId,
    pub trigger_phrase: TriggerPhrase,
    /// The transcript chunk that fired the trigger
    pub transcript: String,
    pub location_fix: Option<LocationFix>,
    /// Why `location_fix` is absent, when a lookup was attempted
    pub location_error: Option<LocationError>,
    recipients: Vec<Contact>,
    per_recipient_status: BTreeMap<String, DeliveryStatus>,
    pub state: AlertState,
    /// The text sent to recipients, once formatted
    pub message: Option<String>,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AlertEvent {
    /// Create an event for `trigger` addressed to a snapshot of `recipients`
    pub fn new(trigger: &TriggerMatch, recipients: Vec<Contact>) -> Self {
        let per_recipient_status = recipients
            .iter()
            .map(|c| (c.id.clone(), DeliveryStatus::Pending))
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            trigger_phrase: trigger.phrase.clone(),
            transcript: trigger.transcript.clone(),
            location_fix: None,
            location_error: None,
            recipients,
            per_recipient_status,
            state: AlertState::Queued,
            message: None,
            cancelled: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Recipients in notification order
    pub fn recipients(&self) -> &[Contact] {
        &self.recipients
    }

    pub fn status_of(&self, contact_id: &str) -> Option<&DeliveryStatus> {
        self.per_recipient_status.get(contact_id)
    }

    pub fn per_recipient_status(&self) -> &BTreeMap<String, DeliveryStatus> {
        &self.per_recipient_status
    }

    /// Record a delivery outcome
    ///
    /// Ignored for IDs outside the recipient snapshot and for recipients that
    /// already reached a terminal status.
    pub fn record_outcome(&mut self, contact_id: &str, status: DeliveryStatus) -> bool {
        match self.per_recipient_status.get_mut(contact_id) {
            Some(current) if !current.is_terminal() => {
                *current = status;
                true
            }
            Some(_) => false,
            None => {
                crate::warn!(
                    "[alert] Ignoring outcome for {} which is not a recipient of {}",
                    contact_id,
                    self.id
                );
                false
            }
        }
    }

    /// Mark every still-pending recipient as cancelled
    pub fn cancel_pending(&mut self) {
        self.cancelled = true;
        for status in self.per_recipient_status.values_mut() {
            if !status.is_terminal() {
                *status = DeliveryStatus::Cancelled;
            }
        }
    }

    /// Every recipient has a terminal status
    pub fn all_terminal(&self) -> bool {
        self.per_recipient_status.values().all(DeliveryStatus::is_terminal)
    }

    pub fn complete(&mut self) {
        self.state = AlertState::Complete;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_complete(&self) -> bool {
        self.state == AlertState::Complete
    }

    pub fn summary(&self) -> DeliverySummary {
        let mut summary = DeliverySummary::default();
        for status in self.per_recipient_status.values() {
            match status {
                DeliveryStatus::Pending => summary.pending += 1,
                DeliveryStatus::Sent => summary.sent += 1,
                DeliveryStatus::Failed { .. } => summary.failed += 1,
                DeliveryStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
