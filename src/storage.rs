//!
//! tenderguard session storage
//! ---------------------------
//! Persistence for the single session a console process holds, so a login survives a reload.
//!
//! Only the identity and the authenticated flag are written. The permission index is never
//! stored: it is rebuilt from the identity's role on restore so that it cannot go stale.
//!
//! Two backends are provided: `MemorySessionStore` for tests and per-connection HTTP sessions,
//! and `FileSessionStore`, a JSON file used by the CLI.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::Identity;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("session store corrupt at {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

/// The persisted shape of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedSession {
    pub identity: Identity,
    pub is_authenticated: bool,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    pub fn new(identity: Identity, is_authenticated: bool) -> Self {
        Self { identity, is_authenticated, saved_at: Utc::now() }
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, StoreError>;
    fn save(&self, session: &PersistedSession) -> Result<(), StoreError>;
    /// Remove the entry. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<PersistedSession>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, StoreError> { Ok(self.slot.read().clone()) }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        *self.slot.write() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.slot.write().take();
        Ok(())
    }
}

/// JSON file holding one `PersistedSession`. A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self { Self { path: path.as_ref().to_path_buf() } }

    pub fn path(&self) -> &Path { &self.path }

    fn io_err(&self, source: std::io::Error) -> StoreError { StoreError::Io { path: self.path.clone(), source } }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        if text.trim().is_empty() { return Ok(None); }
        let saved = serde_json::from_str(&text).map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        Ok(Some(saved))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
            }
        }
        let body = serde_json::to_string_pretty(session).map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        fs::write(&self.path, body).map_err(|e| self.io_err(e))?;
        debug!(target: "tenderguard::session", path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
