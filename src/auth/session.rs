// Auth session - tracks sign-in state for the signed-in user

use super::{AuthError, IdentityProvider, PhoneVerification};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

const EMPTY_CREDENTIALS: &str = "Email or Password cannot be empty";
const EMPTY_PHONE: &str = "Phone number cannot be empty";

/// Sign-in state observed by whatever presents the login flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum AuthState {
    /// A provider request is in progress
    Loading,
    Authenticated,
    Unauthenticated,
    /// Last attempt failed with this message
    Error(String),
    /// A phone code was sent and awaits verification
    CodeSent { verification_id: String },
}

/// Drives sign-in flows against an identity provider and publishes the result
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    state_tx: watch::Sender<AuthState>,
}

impl AuthSession {
    /// Create a session whose initial state reflects the provider's current user
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Loading);
        let session = Self { provider, state_tx };
        session.check_auth_status();
        session
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state_tx.borrow(), AuthState::Authenticated)
    }

    /// Re-read the provider's current user
    pub fn check_auth_status(&self) {
        let state = if self.provider.current_user().is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        self.set_state(state);
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthState {
        if email.is_empty() || password.is_empty() {
            return self.set_state(AuthState::Error(EMPTY_CREDENTIALS.to_string()));
        }

        self.set_state(AuthState::Loading);
        let result = self.provider.sign_in_with_email(email, password).await;
        self.settle(result.map(|_| ()))
    }

    pub async fn signup(&self, email: &str, password: &str) -> AuthState {
        if email.is_empty() || password.is_empty() {
            return self.set_state(AuthState::Error(EMPTY_CREDENTIALS.to_string()));
        }

        self.set_state(AuthState::Loading);
        let result = self.provider.create_account(email, password).await;
        self.settle(result.map(|_| ()))
    }

    /// Start phone sign-in
    ///
    /// Ends in `CodeSent` when the provider sends a code, or `Authenticated`
    /// when it verifies the number on its own.
    pub async fn login_with_phone(&self, phone_number: &str) -> AuthState {
        if phone_number.is_empty() {
            return self.set_state(AuthState::Error(EMPTY_PHONE.to_string()));
        }

        self.set_state(AuthState::Loading);
        match self.provider.request_phone_code(phone_number).await {
            Ok(PhoneVerification::CodeSent(verification_id)) => {
                crate::info!("[auth] Verification code sent");
                self.set_state(AuthState::CodeSent { verification_id })
            }
            Ok(PhoneVerification::Verified(_)) => self.set_state(AuthState::Authenticated),
            Err(e) => self.settle(Err(e)),
        }
    }

    pub async fn verify_otp(&self, verification_id: &str, code: &str) -> AuthState {
        let result = self.provider.verify_phone_code(verification_id, code).await;
        self.settle(result.map(|_| ()))
    }

    pub async fn logout(&self) -> AuthState {
        self.provider.sign_out().await;
        self.set_state(AuthState::Unauthenticated)
    }

    fn settle(&self, result: Result<(), AuthError>) -> AuthState {
        match result {
            Ok(()) => self.set_state(AuthState::Authenticated),
            Err(e) => {
                crate::warn!("[auth] Sign-in failed: {}", e);
                self.set_state(AuthState::Error(e.to_string()))
            }
        }
    }

    fn set_state(&self, state: AuthState) -> AuthState {
        self.state_tx.send_replace(state.clone());
        state
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
