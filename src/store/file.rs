//! File-backed session store
//!
//! Both slots live in a single JSON document so they can only change
//! together. Writes land in a uniquely named temp file next to the target and
//! are flushed and moved into place with `rename`, which leaves either the old
//! or the new document behind if the process dies mid-write. The temp file is
//! created owner-only on unix. With a key configured the
//! document is sealed with AES-256-GCM before it touches the disk.

use super::{session_to_slots, SessionRead, SessionStore, StoreError, TOKEN_SLOT, USER_SLOT};
use crate::models::Session;
use crate::settings::StoreSettings;
use crate::utils::crypto::{decrypt_data, derive_encryption_key, encrypt_data, ENCRYPTION_KEY_SIZE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Current on-disk document version
const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    version: u32,
    saved_at: DateTime<Utc>,
    slots: BTreeMap<String, String>,
}

/// Session store persisting to a single file
#[derive(Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    encryption_key: Option<[u8; ENCRYPTION_KEY_SIZE]>,
}

impl FileSessionStore {
    /// Create a plaintext store at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encryption_key: None,
        }
    }

    /// Seal the document with a key derived from `key_material`
    #[must_use]
    pub fn with_encryption_key(mut self, key_material: &[u8]) -> Self {
        self.encryption_key = Some(derive_encryption_key(key_material));
        self
    }

    /// Create a store from settings, sealing it when a key is configured
    #[must_use]
    pub fn from_settings(settings: &StoreSettings) -> Self {
        let store = Self::new(&settings.path);
        match settings.get_encryption_key() {
            Some(key) => store.with_encryption_key(key.as_bytes()),
            None => store,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.encryption_key.is_some()
    }

    fn encode(&self, document: &StoredDocument) -> Result<String, StoreError> {
        match &self.encryption_key {
            Some(key) => encrypt_data(document, key).map_err(|e| StoreError::Encryption(e.to_string())),
            None => serde_json::to_string_pretty(document)
                .map_err(|e| StoreError::Serialization(e.to_string())),
        }
    }

    fn decode(&self, raw: &str) -> Result<StoredDocument, String> {
        match &self.encryption_key {
            Some(key) => decrypt_data(raw, key).map_err(|e| format!("{e:#}")),
            None => serde_json::from_str(raw).map_err(|e| e.to_string()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let suffix = format!("{}.tmp", uuid::Uuid::new_v4().simple());
        self.path.with_extension(suffix)
    }

    async fn write_document(&self, contents: String) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("Failed to prepare store directory: {e}")))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = write_private_file(&temp_path, contents.as_bytes()).await {
            discard_temp_file(&temp_path).await;
            return Err(StoreError::Io(format!("Failed to write session document: {e}")));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            discard_temp_file(&temp_path).await;
            return Err(StoreError::Io(format!(
                "Failed to finalize session document: {e}"
            )));
        }

        Ok(())
    }
}

/// Create `path` readable by the owner only, write `contents` and flush to disk
async fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

async fn discard_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove temp file {}: {e}", path.display()),
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn read(&self) -> Result<SessionRead, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SessionRead::Absent),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let document = match self.decode(&raw) {
            Ok(document) => document,
            Err(reason) => return Ok(SessionRead::Corrupted(reason)),
        };

        if document.version != DOCUMENT_VERSION {
            return Ok(SessionRead::Corrupted(format!(
                "unsupported document version {}",
                document.version
            )));
        }

        log::debug!(
            "Loaded session document saved at {} from {}",
            document.saved_at,
            self.path.display()
        );

        Ok(SessionRead::from_slots(
            document.slots.get(TOKEN_SLOT).map(String::as_str),
            document.slots.get(USER_SLOT).map(String::as_str),
        ))
    }

    async fn write(&self, session: &Session) -> Result<(), StoreError> {
        let (token, user) = session_to_slots(session)?;

        let mut slots = BTreeMap::new();
        slots.insert(TOKEN_SLOT.to_string(), token);
        slots.insert(USER_SLOT.to_string(), user);

        let document = StoredDocument {
            version: DOCUMENT_VERSION,
            saved_at: Utc::now(),
            slots,
        };

        let contents = self.encode(&document)?;
        self.write_document(contents).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(format!(
                "Failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
