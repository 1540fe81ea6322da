// Pipeline handle - intake, cancellation and observation of a running pipeline

use super::worker::{PipelineState, QueuedAlert};
use crate::alert::{AlertEvent, AlertHistory, AlertId};
use crate::cancel::CancelToken;
use crate::contacts::ContactBook;
use crate::events::{current_timestamp, AlertCreatedPayload, AlertEventEmitter};
use crate::listener::TriggerMatch;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Errors returned by pipeline operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// The pipeline no longer accepts alerts
    #[error("Alert pipeline has shut down")]
    ShutDown,
    /// No alert with this ID is known
    #[error("Unknown alert {0}")]
    UnknownAlert(AlertId),
    /// The alert already finished; nothing left to cancel
    #[error("Alert {0} is already complete")]
    AlreadyComplete(AlertId),
}

/// State shared between the handle and the worker task
pub(super) struct Shared {
    state_tx: watch::Sender<PipelineState>,
    /// Events submitted but not yet finished, including the in-flight one
    pending_tx: watch::Sender<usize>,
    /// Cancel tokens for queued and in-flight events
    tokens: Mutex<HashMap<AlertId, CancelToken>>,
    /// Every alert the worker has finished, kept after history eviction
    completed: Mutex<HashSet<AlertId>>,
    current: Mutex<Option<AlertId>>,
}

impl Shared {
    pub(super) fn new() -> Self {
        let (state_tx, _) = watch::channel(PipelineState::Idle);
        let (pending_tx, _) = watch::channel(0);
        Self {
            state_tx,
            pending_tx,
            tokens: Mutex::new(HashMap::new()),
            completed: Mutex::new(HashSet::new()),
            current: Mutex::new(None),
        }
    }

    pub(super) fn set_state(&self, state: PipelineState) {
        self.state_tx.send_replace(state);
    }

    pub(super) fn set_current(&self, id: Option<AlertId>) {
        *self.current.lock() = id;
    }

    pub(super) fn forget_token(&self, id: &AlertId) {
        self.tokens.lock().remove(id);
    }

    /// Record `id` as finished, then drop its cancel token
    pub(super) fn mark_complete(&self, id: &AlertId) {
        self.completed.lock().insert(id.clone());
        self.forget_token(id);
    }

    pub(super) fn finish_one(&self) {
        self.pending_tx.send_modify(|pending| *pending = pending.saturating_sub(1));
    }
}

/// Handle to a running alert pipeline
///
/// Shared by reference (or `Arc`) between the listener forwarding task and
/// whoever owns the session.
pub struct PipelineHandle {
    queue_tx: Mutex<Option<mpsc::UnboundedSender<QueuedAlert>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<Shared>,
    contacts: Arc<RwLock<ContactBook>>,
    history: Arc<AlertHistory>,
    emitter: Arc<dyn AlertEventEmitter>,
}

impl PipelineHandle {
    pub(super) fn new(
        queue_tx: mpsc::UnboundedSender<QueuedAlert>,
        worker: JoinHandle<()>,
        shared: Arc<Shared>,
        contacts: Arc<RwLock<ContactBook>>,
        history: Arc<AlertHistory>,
        emitter: Arc<dyn AlertEventEmitter>,
    ) -> Self {
        Self {
            queue_tx: Mutex::new(Some(queue_tx)),
            worker: Mutex::new(Some(worker)),
            shared,
            contacts,
            history,
            emitter,
        }
    }

    /// Create an alert event for `trigger` and queue it
    ///
    /// Recipients are snapshotted from the contact book now; later contact
    /// edits do not affect this event. Never drops an event while running.
    pub fn submit(&self, trigger: TriggerMatch) -> Result<AlertId, PipelineError> {
        // Held through the send: history order, queue position and
        // channel order must agree across concurrent submitters
        let queue_guard = self.queue_tx.lock();
        let queue_tx = queue_guard.as_ref().ok_or(PipelineError::ShutDown)?;

        let recipients = self.contacts.read().list();
        let event = AlertEvent::new(&trigger, recipients);
        let id = event.id.clone();
        let cancel = CancelToken::new();

        self.history.record(&event);
        self.shared.tokens.lock().insert(id.clone(), cancel.clone());

        let mut queue_position = 0;
        self.shared.pending_tx.send_modify(|pending| {
            queue_position = *pending;
            *pending += 1;
        });

        self.emitter.emit_alert_created(AlertCreatedPayload {
            alert_id: id.clone(),
            trigger_phrase: event.trigger_phrase.to_string(),
            recipient_count: event.recipients().len(),
            queue_position,
            timestamp: current_timestamp(),
        });

        if queue_tx.send(QueuedAlert { event, cancel }).is_err() {
            crate::error!("[pipeline] Worker gone, alert {} not queued", id);
            self.shared.forget_token(&id);
            self.shared.finish_one();
            return Err(PipelineError::ShutDown);
        }
        drop(queue_guard);

        crate::info!(
            "[pipeline] Alert {} queued ({} ahead)",
            id,
            queue_position
        );
        Ok(id)
    }

    /// Cancel a queued or in-flight alert
    ///
    /// Sends already acknowledged stay sent.
    pub fn cancel(&self, id: &AlertId) -> Result<(), PipelineError> {
        if let Some(token) = self.shared.tokens.lock().get(id) {
            if token.cancel() {
                crate::info!("[pipeline] Cancellation requested for alert {}", id);
            }
            return Ok(());
        }

        if self.shared.completed.lock().contains(id) {
            return Err(PipelineError::AlreadyComplete(id.clone()));
        }
        Err(PipelineError::UnknownAlert(id.clone()))
    }

    /// Cancel the in-flight alert, returning its ID if there was one
    pub fn cancel_current(&self) -> Option<AlertId> {
        let current = self.shared.current.lock().clone()?;
        self.cancel(&current).ok()?;
        Some(current)
    }

    /// ID of the alert being processed, if any
    pub fn current(&self) -> Option<AlertId> {
        self.shared.current.lock().clone()
    }

    pub fn state(&self) -> PipelineState {
        *self.shared.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.shared.state_tx.subscribe()
    }

    /// Alerts submitted and not yet complete
    pub fn pending(&self) -> usize {
        *self.shared.pending_tx.borrow()
    }

    /// Wait until every submitted alert has completed
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.pending_tx.subscribe();
        let _ = rx.wait_for(|pending| *pending == 0).await;
    }

    pub fn history(&self) -> &Arc<AlertHistory> {
        &self.history
    }

    /// Stop accepting alerts, let queued ones finish, then stop the worker
    pub async fn shutdown(&self) {
        let queue_tx = self.queue_tx.lock().take();
        if queue_tx.is_none() {
            return;
        }
        drop(queue_tx);
        crate::info!("[pipeline] Shutting down, draining {} alerts", self.pending());

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                crate::error!("[pipeline] Worker task failed: {}", e);
            }
        }
    }
}
