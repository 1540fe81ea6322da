// Safety session - wires trigger, contacts, listener and alert pipeline together
// for a signed-in user

use crate::alert::{AlertEvent, AlertHistory, AlertId};
use crate::auth::AuthSession;
use crate::config::{Settings, SettingsError};
use crate::contacts::{Contact, ContactBook, ContactError};
use crate::dispatch::{NotificationDispatcher, SmsTransport};
use crate::events::AlertEventEmitter;
use crate::listener::{ListenerError, ListenerSession, ListenerStats, TranscriptSource};
use crate::location::{LocationProvider, LocationResolver};
use crate::pipeline::{AlertPipeline, PipelineError, PipelineHandle};
use crate::trigger::{TriggerError, TriggerPhrase, TriggerStore};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Errors surfaced by session operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Sign in before starting a safety session")]
    NotAuthenticated,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Trigger(#[from] TriggerError),
    #[error(transparent)]
    Contact(#[from] ContactError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Collaborators a session talks to outside the process
pub struct SessionServices {
    pub location: Arc<dyn LocationProvider>,
    pub transport: Arc<dyn SmsTransport>,
    pub emitter: Arc<dyn AlertEventEmitter>,
}

/// A running safety session for one authenticated user
pub struct SafetySession {
    trigger: Arc<RwLock<TriggerStore>>,
    contacts: Arc<RwLock<ContactBook>>,
    pipeline: Arc<PipelineHandle>,
}

impl SafetySession {
    /// Start a session and its alert pipeline
    ///
    /// Requires `auth` to be Authenticated. Loads the trigger phrase and
    /// contacts from `settings.data_dir` when one is configured. Must be
    /// called from within a tokio runtime.
    pub fn start(
        auth: &AuthSession,
        settings: &Settings,
        services: SessionServices,
    ) -> Result<Self, SessionError> {
        if !auth.is_authenticated() {
            crate::warn!("[session] Refusing to start without an authenticated user");
            return Err(SessionError::NotAuthenticated);
        }
        settings.validate()?;

        let trigger = match settings.trigger_path() {
            Some(path) => TriggerStore::with_path(path)?,
            None => TriggerStore::new(),
        };
        let contacts = match settings.contacts_path() {
            Some(path) => ContactBook::with_path(path)?,
            None => ContactBook::new(),
        };
        let trigger = Arc::new(RwLock::new(trigger));
        let contacts = Arc::new(RwLock::new(contacts));

        let pipeline = AlertPipeline::new(
            LocationResolver::new(services.location),
            NotificationDispatcher::new(services.transport, settings.send_timeout()),
            contacts.clone(),
            Arc::new(AlertHistory::new(settings.history_capacity)),
            services.emitter,
            settings,
        )
        .spawn();

        crate::info!(
            "[session] Safety session started ({} contacts, trigger {})",
            contacts.read().len(),
            if trigger.read().current().is_some() { "set" } else { "unset" }
        );

        Ok(Self {
            trigger,
            contacts,
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn set_trigger(&self, phrase: &str) -> Result<TriggerPhrase, SessionError> {
        Ok(self.trigger.write().set(phrase)?)
    }

    pub fn trigger(&self) -> Option<TriggerPhrase> {
        self.trigger.read().current().cloned()
    }

    pub fn add_contact(&self, name: &str, phone_number: &str) -> Result<Contact, SessionError> {
        Ok(self.contacts.write().add(name, phone_number)?)
    }

    pub fn remove_contact(&self, id: &str) -> Result<Contact, SessionError> {
        Ok(self.contacts.write().remove(id)?)
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.read().list()
    }

    /// Listen to `source` until it ends or fails
    ///
    /// Every match is queued on the alert pipeline as it is detected. Returns
    /// the listener result; a stream failure does not affect alerts already
    /// queued.
    pub async fn listen<S: TranscriptSource>(&self, mut source: S) -> Result<ListenerStats, SessionError> {
        let (match_tx, mut match_rx) = mpsc::unbounded_channel();
        let listener = ListenerSession::new(self.trigger.clone(), match_tx);

        let pipeline = self.pipeline.clone();
        let forward = tokio::spawn(async move {
            while let Some(found) = match_rx.recv().await {
                if let Err(e) = pipeline.submit(found) {
                    crate::error!("[session] Dropping trigger match: {}", e);
                    break;
                }
            }
        });

        let result = listener.run(&mut source).await;
        drop(listener);

        if let Err(e) = forward.await {
            crate::error!("[session] Match forwarding task failed: {}", e);
        }
        Ok(result?)
    }

    pub fn cancel_alert(&self, id: &AlertId) -> Result<(), SessionError> {
        Ok(self.pipeline.cancel(id)?)
    }

    pub fn cancel_current_alert(&self) -> Option<AlertId> {
        self.pipeline.cancel_current()
    }

    /// Recent alert events, newest first
    pub fn recent_alerts(&self) -> Vec<AlertEvent> {
        self.pipeline.history().recent()
    }

    pub fn pipeline(&self) -> &PipelineHandle {
        &self.pipeline
    }

    /// Stop accepting alerts and wait for queued ones to finish
    pub async fn shutdown(&self) {
        self.pipeline.shutdown().await;
        crate::info!("[session] Safety session stopped");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
