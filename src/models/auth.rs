//! Authentication state and error types
//!
//! This module defines the state machine states observed by UI collaborators
//! and the typed error taxonomy returned by the session manager, so callers
//! can branch on the kind of failure instead of matching message text.

use crate::provider::ProviderError;
use crate::store::StoreError;
use crate::verifier::VerifierError;
use std::fmt;

/// States of the authentication state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    /// No session; initial state
    Unauthenticated,
    /// A sign-in attempt is in flight
    Authenticating,
    /// A session is held in memory and persisted in the store
    Authenticated,
    /// A sign-in attempt just failed; always resolves to `Unauthenticated`
    Error,
}

impl AuthState {
    /// Whether a new sign-in attempt may start from this state
    #[must_use]
    pub const fn accepts_sign_in(self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Error)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticating => write!(f, "authenticating"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Error => write!(f, "error"),
        }
    }
}

/// A state transition published to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthEvent {
    pub from: AuthState,
    pub to: AuthState,
}

/// Errors surfaced by sign-in and sign-out
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity provider failed or the user cancelled
    #[error("Identity provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider returned no exchangeable server auth code
    #[error("Server auth code not received from identity provider")]
    MissingAuthCode,

    /// The backend could not be reached or answered with garbage
    #[error("Verification transport error: {0}")]
    VerificationTransport(#[from] VerifierError),

    /// The backend explicitly declined, or violated the response contract
    #[error("{0}")]
    BackendRejected(String),

    /// Another sign-in attempt is already running
    #[error("A sign-in attempt is already in progress")]
    AlreadyInProgress,

    /// A session is already active; sign out first
    #[error("Already signed in; sign out before starting a new sign-in")]
    AlreadyAuthenticated,

    /// The attempt finished after a sign-out and was discarded
    #[error("Sign-in was superseded by a sign-out")]
    Superseded,

    /// The session store could not be written or cleared
    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Whether the UI should offer an immediate retry via a fresh sign-in
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::Provider(_)
                | AuthError::MissingAuthCode
                | AuthError::VerificationTransport(_)
                | AuthError::BackendRejected(_)
                | AuthError::Superseded
                | AuthError::Storage(_)
        )
    }
}
