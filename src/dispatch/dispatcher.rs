// Notification dispatcher - isolated per-recipient delivery
//
// Each recipient gets its own task, so a failing, hanging or panicking send
// only ever affects that recipient's outcome. No retries happen here.

use crate::alert::DeliveryStatus;
use crate::cancel::CancelToken;
use crate::contacts::Contact;
use super::SmsTransport;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Fans an alert message out to a list of recipients
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn SmsTransport>,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn SmsTransport>, send_timeout: Duration) -> Self {
        Self {
            transport,
            send_timeout,
        }
    }

    /// Deliver `message` to every recipient, returning each recipient's outcome by contact ID
    pub async fn dispatch(
        &self,
        message: &str,
        recipients: &[Contact],
        cancel: &CancelToken,
    ) -> BTreeMap<String, DeliveryStatus> {
        self.dispatch_with_progress(message, recipients, cancel, |_, _| {})
            .await
    }

    /// Like `dispatch`, calling `on_outcome` as each recipient finishes
    ///
    /// Sends start in recipient order and run concurrently. Returns once every
    /// recipient has a terminal status.
    pub async fn dispatch_with_progress<F>(
        &self,
        message: &str,
        recipients: &[Contact],
        cancel: &CancelToken,
        mut on_outcome: F,
    ) -> BTreeMap<String, DeliveryStatus>
    where
        F: FnMut(&Contact, &DeliveryStatus),
    {
        let mut outcomes = BTreeMap::new();

        if cancel.is_cancelled() {
            crate::info!(
                "[dispatch] Cancelled before sending to {} recipients",
                recipients.len()
            );
            for contact in recipients {
                let status = DeliveryStatus::Cancelled;
                on_outcome(contact, &status);
                outcomes.insert(contact.id.clone(), status);
            }
            return outcomes;
        }

        crate::info!("[dispatch] Sending alert to {} recipients", recipients.len());

        let mut in_flight = FuturesUnordered::new();
        for (index, contact) in recipients.iter().enumerate() {
            let handle = tokio::spawn(send_one(
                self.transport.clone(),
                contact.phone_number.clone(),
                message.to_string(),
                self.send_timeout,
                cancel.clone(),
            ));
            in_flight.push(async move { (index, handle.await) });
        }

        while let Some((index, joined)) = in_flight.next().await {
            let contact = &recipients[index];
            let status = joined.unwrap_or_else(|e| {
                crate::error!("[dispatch] Send task for {} panicked: {}", contact.id, e);
                DeliveryStatus::Failed {
                    reason: "transport task panicked".to_string(),
                }
            });

            match &status {
                DeliveryStatus::Sent => {
                    crate::info!("[dispatch] Delivered to {}", contact.display_name)
                }
                DeliveryStatus::Failed { reason } => crate::warn!(
                    "[dispatch] Delivery to {} failed: {}",
                    contact.display_name,
                    reason
                ),
                DeliveryStatus::Cancelled => {
                    crate::info!("[dispatch] Delivery to {} cancelled", contact.display_name)
                }
                DeliveryStatus::Pending => {}
            }

            on_outcome(contact, &status);
            outcomes.insert(contact.id.clone(), status);
        }

        outcomes
    }
}

/// Send to one recipient, racing the transport against cancellation
async fn send_one(
    transport: Arc<dyn SmsTransport>,
    phone_number: String,
    text: String,
    send_timeout: Duration,
    cancel: CancelToken,
) -> DeliveryStatus {
    if cancel.is_cancelled() {
        return DeliveryStatus::Cancelled;
    }

    let send = tokio::time::timeout(send_timeout, transport.send(&phone_number, &text));

    tokio::select! {
        // An acknowledgement that is ready wins over a concurrent cancel
        biased;
        result = send => match result {
            Ok(Ok(())) => DeliveryStatus::Sent,
            Ok(Err(e)) => DeliveryStatus::Failed { reason: e.to_string() },
            Err(_) => DeliveryStatus::Failed {
                reason: format!("send timed out after {}ms", send_timeout.as_millis()),
            },
        },
        _ = cancel.cancelled() => DeliveryStatus::Cancelled,
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
pub(crate) mod tests;
