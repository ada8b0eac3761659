//! Durable session persistence
//!
//! A session is kept in two logical slots: the opaque token and the
//! serialized user record. Stores must make both slots change together so that
//! no reader ever observes a token without its user or the other way round.
//!
//! # Modules
//!
//! - [`file`] - Single-document file store with atomic replace and optional sealing
//! - [`memory`] - In-process slot map

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::models::{Session, UserRecord};
use async_trait::async_trait;

/// Slot holding the opaque session token
pub const TOKEN_SLOT: &str = "authToken";

/// Slot holding the serialized [`UserRecord`]
pub const USER_SLOT: &str = "user";

/// Outcome of reading the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRead {
    /// A well-formed session
    Present(Session),
    /// Nothing stored
    Absent,
    /// Something is stored but it is not a usable session
    Corrupted(String),
}

impl SessionRead {
    /// The session, treating corruption as absence
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        match self {
            SessionRead::Present(session) => Some(session),
            SessionRead::Absent | SessionRead::Corrupted(_) => None,
        }
    }

    /// Interpret raw slot contents
    ///
    /// Exactly one populated slot, an empty token, or a user payload that does
    /// not parse all count as corruption.
    #[must_use]
    pub fn from_slots(token: Option<&str>, user: Option<&str>) -> Self {
        match (token, user) {
            (None, None) => SessionRead::Absent,
            (Some(_), None) => SessionRead::Corrupted("token slot present without user".to_string()),
            (None, Some(_)) => SessionRead::Corrupted("user slot present without token".to_string()),
            (Some(token), Some(_)) if token.is_empty() => {
                SessionRead::Corrupted("token slot is empty".to_string())
            }
            (Some(token), Some(user)) => match serde_json::from_str::<UserRecord>(user) {
                Ok(user) => SessionRead::Present(Session::new(token.to_string(), user)),
                Err(e) => SessionRead::Corrupted(format!("user slot does not parse: {e}")),
            },
        }
    }
}

/// Serialize a session into `(token, user)` slot values
///
/// # Errors
///
/// Returns an error if the user record cannot be serialized.
pub fn session_to_slots(session: &Session) -> Result<(String, String), StoreError> {
    let user = serde_json::to_string(&session.user)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok((session.token.clone(), user))
}

/// Session store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Filesystem or backing storage failure
    #[error("I/O failure: {0}")]
    Io(String),

    /// The session could not be encoded
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Sealing the stored document failed
    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// Local key-value persistence for the session
///
/// Only the session manager writes through this trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read both slots as one record
    ///
    /// Corrupted content is reported as [`SessionRead::Corrupted`], never as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing storage cannot be accessed.
    async fn read(&self) -> Result<SessionRead, StoreError>;

    /// Replace the stored session, updating both slots together
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be encoded or persisted. On
    /// error the previously stored record is left intact.
    async fn write(&self, session: &Session) -> Result<(), StoreError>;

    /// Remove both slots; succeeds when already empty
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    async fn clear(&self) -> Result<(), StoreError>;
}
