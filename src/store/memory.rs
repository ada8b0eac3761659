use super::{session_to_slots, SessionRead, SessionStore, StoreError, TOKEN_SLOT, USER_SLOT};
use crate::models::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-process session store backed by a slot map
///
/// Both slots are updated under one lock, so readers never see a half-written
/// session. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a raw value into a slot, bypassing session encoding
    ///
    /// Used to seed legacy or damaged state, e.g. a token next to a user
    /// payload that no longer parses.
    pub fn insert_raw(&self, slot: &str, value: &str) {
        self.slots().insert(slot.to_string(), value.to_string());
    }

    /// Raw contents of a slot
    #[must_use]
    pub fn raw(&self, slot: &str) -> Option<String> {
        self.slots().get(slot).cloned()
    }

    /// Whether both slots are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let slots = self.slots();
        !slots.contains_key(TOKEN_SLOT) && !slots.contains_key(USER_SLOT)
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn read(&self) -> Result<SessionRead, StoreError> {
        let slots = self.slots();
        Ok(SessionRead::from_slots(
            slots.get(TOKEN_SLOT).map(String::as_str),
            slots.get(USER_SLOT).map(String::as_str),
        ))
    }

    async fn write(&self, session: &Session) -> Result<(), StoreError> {
        let (token, user) = session_to_slots(session)?;
        let mut slots = self.slots();
        slots.insert(TOKEN_SLOT.to_string(), token);
        slots.insert(USER_SLOT.to_string(), user);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut slots = self.slots();
        slots.remove(TOKEN_SLOT);
        slots.remove(USER_SLOT);
        Ok(())
    }
}
