// Pipeline worker - processes one queued alert event at a time

use super::handle::{PipelineHandle, Shared};
use crate::alert::{AlertEvent, AlertHistory, AlertState};
use crate::cancel::CancelToken;
use crate::config::Settings;
use crate::contacts::ContactBook;
use crate::dispatch::message::format_alert_message;
use crate::dispatch::NotificationDispatcher;
use crate::events::{
    current_timestamp, AlertCompletedPayload, AlertDeliveryPayload, AlertEventEmitter,
    AlertStateChangedPayload,
};
use crate::location::LocationResolver;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Observable state of the pipeline as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineState {
    Idle,
    AwaitingLocation,
    Dispatching,
    Complete,
}

/// An alert event waiting for the worker
pub(super) struct QueuedAlert {
    pub event: AlertEvent,
    pub cancel: CancelToken,
}

/// Orchestrates location lookup and notification dispatch for alert events
///
/// Build one per session and call `spawn` to start its worker.
pub struct AlertPipeline {
    resolver: LocationResolver,
    dispatcher: NotificationDispatcher,
    contacts: Arc<RwLock<ContactBook>>,
    history: Arc<AlertHistory>,
    emitter: Arc<dyn AlertEventEmitter>,
    location_timeout: Duration,
    message_prefix: String,
}

impl AlertPipeline {
    pub fn new(
        resolver: LocationResolver,
        dispatcher: NotificationDispatcher,
        contacts: Arc<RwLock<ContactBook>>,
        history: Arc<AlertHistory>,
        emitter: Arc<dyn AlertEventEmitter>,
        settings: &Settings,
    ) -> Self {
        Self {
            resolver,
            dispatcher,
            contacts,
            history,
            emitter,
            location_timeout: settings.location_timeout(),
            message_prefix: settings.message_prefix.clone(),
        }
    }

    /// Start the worker task and return the handle used to feed it
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> PipelineHandle {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new());

        let contacts = self.contacts.clone();
        let history = self.history.clone();
        let emitter = self.emitter.clone();

        let worker = tokio::spawn(self.run(queue_rx, shared.clone()));
        crate::info!("[pipeline] Alert pipeline started");

        PipelineHandle::new(queue_tx, worker, shared, contacts, history, emitter)
    }

    async fn run(self, mut queue_rx: mpsc::UnboundedReceiver<QueuedAlert>, shared: Arc<Shared>) {
        while let Some(QueuedAlert { mut event, cancel }) = queue_rx.recv().await {
            shared.set_current(Some(event.id.clone()));

            self.process(&mut event, &cancel, &shared).await;

            shared.mark_complete(&event.id);
            shared.set_current(None);
            shared.set_state(PipelineState::Idle);
            shared.finish_one();
        }

        crate::info!("[pipeline] Queue closed, worker exiting");
    }

    async fn process(&self, event: &mut AlertEvent, cancel: &CancelToken, shared: &Shared) {
        if cancel.is_cancelled() {
            crate::info!("[pipeline] Alert {} cancelled while queued", event.id);
            event.cancel_pending();
            self.finish(event, shared);
            return;
        }

        self.transition(event, AlertState::AwaitingLocation, shared);

        let location = tokio::select! {
            biased;
            result = self.resolver.try_resolve(self.location_timeout) => Some(result),
            _ = cancel.cancelled() => None,
        };

        match location {
            Some(Ok(fix)) => event.location_fix = Some(fix),
            Some(Err(e)) => {
                crate::warn!(
                    "[pipeline] Alert {} proceeding without location: {}",
                    event.id,
                    e
                );
                event.location_error = Some(e);
            }
            None => {
                crate::info!(
                    "[pipeline] Alert {} cancelled while awaiting location",
                    event.id
                );
                event.cancel_pending();
                self.finish(event, shared);
                return;
            }
        }

        let message = format_alert_message(&self.message_prefix, event.location_fix.as_ref());
        event.message = Some(message.clone());
        self.transition(event, AlertState::Dispatching, shared);

        let recipients = event.recipients().to_vec();
        if recipients.is_empty() {
            crate::warn!("[pipeline] Alert {} has no recipients", event.id);
        }

        let history = &self.history;
        let emitter = &self.emitter;
        self.dispatcher
            .dispatch_with_progress(&message, &recipients, cancel, |contact, status| {
                event.record_outcome(&contact.id, status.clone());
                history.record(event);
                emitter.emit_alert_delivery(AlertDeliveryPayload {
                    alert_id: event.id.clone(),
                    contact_id: contact.id.clone(),
                    contact_name: contact.display_name.clone(),
                    status: status.clone(),
                });
            })
            .await;

        if cancel.is_cancelled() {
            event.cancel_pending();
        }

        self.finish(event, shared);
    }

    fn transition(&self, event: &mut AlertEvent, state: AlertState, shared: &Shared) {
        event.state = state;
        self.history.record(event);

        self.emitter.emit_alert_state_changed(AlertStateChangedPayload {
            alert_id: event.id.clone(),
            state,
            timestamp: current_timestamp(),
        });

        let pipeline_state = match state {
            AlertState::Queued => return,
            AlertState::AwaitingLocation => PipelineState::AwaitingLocation,
            AlertState::Dispatching => PipelineState::Dispatching,
            AlertState::Complete => PipelineState::Complete,
        };
        shared.set_state(pipeline_state);
    }

    fn finish(&self, event: &mut AlertEvent, shared: &Shared) {
        event.complete();
        self.transition(event, AlertState::Complete, shared);

        let summary = event.summary();
        crate::info!(
            "[pipeline] Alert {} complete: {} sent, {} failed, {} cancelled",
            event.id,
            summary.sent,
            summary.failed,
            summary.cancelled
        );

        self.emitter.emit_alert_completed(AlertCompletedPayload {
            alert_id: event.id.clone(),
            has_location: event.location_fix.is_some(),
            cancelled: event.cancelled,
            summary,
            timestamp: current_timestamp(),
        });
    }
}
