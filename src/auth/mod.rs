// Identity gate
// Sign-in state that must be Authenticated before a safety session can start

mod provider;
mod session;

pub use provider::{AuthError, AuthUser, IdentityProvider, LocalIdentityProvider, PhoneVerification};
pub use session::{AuthSession, AuthState};
