//! Local user directory: the identity-validation collaborator used by the server and CLI.
//!
//! Records are loaded from a JSON file `{"users": [...]}`. Each record carries the identity fields
//! plus either `password_hash` (Argon2 PHC string) or the legacy plaintext `password`. Plaintext
//! records only authenticate when the directory was opened with `allow_plaintext`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::identity::{Identity, IdentityValidator, LoginError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserRecord {
    pub fn hashed(identity: Identity, password: &str) -> Result<Self> {
        Ok(Self { identity, password_hash: Some(hash_password(password)?), password: None })
    }

    pub fn plaintext(identity: Identity, password: &str) -> Self {
        Self { identity, password_hash: None, password: Some(password.to_string()) }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// In-memory set of user records.
///
/// A directory built with [`UserDirectory::unconfigured`] refuses every login with
/// [`LoginError::NotConfigured`], distinct from a credentials failure.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<UserRecord>,
    allow_plaintext: bool,
    source: Option<PathBuf>,
    configured: bool,
}

impl UserDirectory {
    pub fn from_records(users: Vec<UserRecord>, allow_plaintext: bool) -> Self {
        Self { users, allow_plaintext, source: None, configured: true }
    }

    pub fn unconfigured() -> Self { Self::default() }

    pub fn load<P: AsRef<Path>>(path: P, allow_plaintext: bool) -> Result<Self, LoginError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoginError::Directory(format!("{}: {}", path.display(), e)))?;
        let file: DirectoryFile = serde_json::from_str(&text)
            .map_err(|e| LoginError::Directory(format!("{}: {}", path.display(), e)))?;
        let plaintext = file.users.iter().filter(|u| u.password_hash.is_none() && u.password.is_some()).count();
        if plaintext > 0 {
            if allow_plaintext {
                warn!(target: "tenderguard::auth", count = plaintext, path = %path.display(), "user directory contains plaintext passwords; migrate them to password_hash");
            } else {
                warn!(target: "tenderguard::auth", count = plaintext, path = %path.display(), "plaintext password records will be refused");
            }
        }
        debug!(target: "tenderguard::auth", users = file.users.len(), path = %path.display(), "user directory loaded");
        Ok(Self { users: file.users, allow_plaintext, source: Some(path.to_path_buf()), configured: true })
    }

    /// Write the directory back as JSON (used when provisioning users).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
        }
        let file = DirectoryFile { users: self.users.clone() };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Insert or replace (by username, case-insensitive) a record.
    pub fn upsert(&mut self, record: UserRecord) {
        let login = record.identity.username.clone();
        self.users.retain(|u| !u.identity.matches_login(&login));
        self.users.push(record);
    }

    pub fn users(&self) -> &[UserRecord] { &self.users }

    pub fn source(&self) -> Option<&Path> { self.source.as_deref() }

    fn find(&self, login: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.identity.matches_login(login))
    }

    fn password_matches(&self, record: &UserRecord, password: &str) -> bool {
        if let Some(phc) = record.password_hash.as_deref() {
            return verify_password(phc, password);
        }
        match record.password.as_deref() {
            Some(plain) if self.allow_plaintext => plain == password,
            Some(_) => {
                debug!(target: "tenderguard::auth", user = %record.identity.username, "plaintext record refused");
                false
            }
            None => false,
        }
    }

    /// Synchronous core of [`IdentityValidator::validate`].
    pub fn authenticate(&self, login: &str, password: &str) -> Result<Option<Identity>, LoginError> {
        if !self.configured {
            return Err(LoginError::NotConfigured("no user directory configured".into()));
        }
        let Some(record) = self.find(login) else {
            debug!(target: "tenderguard::auth", user = login.trim(), "unknown user");
            return Ok(None);
        };
        if !self.password_matches(record, password) {
            debug!(target: "tenderguard::auth", user = login.trim(), "password mismatch");
            return Ok(None);
        }
        if !record.identity.is_active {
            debug!(target: "tenderguard::auth", user = login.trim(), "account inactive");
            return Ok(None);
        }
        Ok(Some(record.identity.clone()))
    }
}

#[async_trait]
impl IdentityValidator for UserDirectory {
    async fn validate(&self, username: &str, password: &str) -> Result<Option<Identity>, LoginError> {
        self.authenticate(username, password)
    }
}

#[cfg(test)]
#[path = "security_tests.rs"]
mod tests;
