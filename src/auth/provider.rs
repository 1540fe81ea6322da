// Identity providers

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;

/// Minimum password length accepted by the local provider
const MIN_PASSWORD_LEN: usize = 6;

/// Errors reported by an identity provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("The email address is badly formatted")]
    InvalidEmail,
    #[error("Password should be at least {} characters", MIN_PASSWORD_LEN)]
    WeakPassword,
    #[error("The email address is already in use by another account")]
    AccountExists,
    #[error("The email or password is incorrect")]
    InvalidCredentials,
    #[error("The verification code is invalid")]
    InvalidCode,
    #[error("{0} sign-in is not supported by this provider")]
    Unsupported(&'static str),
    #[error("{0}")]
    Provider(String),
}

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Outcome of requesting a phone verification code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneVerification {
    /// A code was sent; verify it with this ID
    CodeSent(String),
    /// The provider verified the number without a code
    Verified(AuthUser),
}

/// An external identity service (email/password and phone OTP)
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The user signed in right now, if any
    fn current_user(&self) -> Option<AuthUser>;

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn request_phone_code(&self, phone_number: &str) -> Result<PhoneVerification, AuthError>;

    async fn verify_phone_code(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self);
}

struct LocalAccount {
    id: String,
    password: String,
}

/// In-memory email/password accounts for the command-line binary and tests
///
/// Accounts live only as long as the provider. Phone sign-in is not available.
#[derive(Default)]
pub struct LocalIdentityProvider {
    accounts: Mutex<HashMap<String, LocalAccount>>,
    current: Mutex<Option<AuthUser>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn sign_in(&self, email: &str, id: &str) -> AuthUser {
        let user = AuthUser {
            id: id.to_string(),
            email: Some(email.to_string()),
            phone_number: None,
        };
        *self.current.lock() = Some(user.clone());
        user
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn current_user(&self) -> Option<AuthUser> {
        self.current.lock().clone()
    }

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email)?;
        let id = {
            let accounts = self.accounts.lock();
            match accounts.get(&email) {
                Some(account) if account.password == password => account.id.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        crate::info!("[auth] Signed in {}", email);
        Ok(self.sign_in(&email, &id))
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let id = uuid::Uuid::new_v4().to_string();
        {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(&email) {
                return Err(AuthError::AccountExists);
            }
            accounts.insert(
                email.clone(),
                LocalAccount {
                    id: id.clone(),
                    password: password.to_string(),
                },
            );
        }
        crate::info!("[auth] Created account {}", email);
        Ok(self.sign_in(&email, &id))
    }

    async fn request_phone_code(&self, _phone_number: &str) -> Result<PhoneVerification, AuthError> {
        Err(AuthError::Unsupported("Phone"))
    }

    async fn verify_phone_code(
        &self,
        _verification_id: &str,
        _code: &str,
    ) -> Result<AuthUser, AuthError> {
        Err(AuthError::Unsupported("Phone"))
    }

    async fn sign_out(&self) {
        if let Some(user) = self.current.lock().take() {
            crate::info!("[auth] Signed out {}", user.id);
        }
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
