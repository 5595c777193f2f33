use std::sync::Arc;

use crate::permission::PermissionIndex;
use crate::storage::{MemorySessionStore, PersistedSession, SessionStore, StoreError};
use crate::tprintln;

use super::principal::Identity;
use super::provider::{Credentials, IdentityValidator, LoginError};

/// Everything the resolver reads. Replaced as a whole on login/logout, never patched.
#[derive(Debug, Clone, Default)]
pub(super) struct SessionState {
    pub(super) identity: Option<Identity>,
    pub(super) index: PermissionIndex,
    pub(super) authenticated: bool,
}

impl SessionState {
    fn authenticated(identity: Identity) -> Self {
        let index = PermissionIndex::build(identity.permission_tokens());
        Self { identity: Some(identity), index, authenticated: true }
    }
}

/// Holds at most one authenticated identity together with its derived permission index.
///
/// A session is an explicit value: construct one per caller (or per test) and pass it by
/// reference. Only `{identity, is_authenticated}` reaches the backing [`SessionStore`]; the
/// index is re-derived from the identity's role whenever a session is populated.
pub struct Session {
    pub(super) state: SessionState,
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { state: SessionState::default(), store }
    }

    /// Session backed by a throwaway in-memory store.
    pub fn in_memory() -> Self { Self::new(Arc::new(MemorySessionStore::default())) }

    /// Rebuild a session from whatever the store persisted.
    /// Entries that are not authenticated, or whose identity was deactivated, come back empty.
    pub fn restore(store: Arc<dyn SessionStore>) -> Result<Self, StoreError> {
        let mut session = Self::new(store);
        if let Some(saved) = session.store.load()? {
            if saved.is_authenticated && saved.identity.is_active {
                tracing::debug!(target: "tenderguard::session", user = %saved.identity.username, "session restored");
                session.state = SessionState::authenticated(saved.identity);
            } else {
                tracing::debug!(target: "tenderguard::session", "persisted session not usable; starting empty");
            }
        }
        Ok(session)
    }

    /// Validate credentials and, on success, populate the session.
    ///
    /// The session stays unauthenticated until the validator has answered and the index is
    /// built; the new state is then swapped in at once. Any failure leaves the session empty.
    pub async fn login(&mut self, creds: &Credentials, validator: &dyn IdentityValidator) -> Result<(), LoginError> {
        let login = creds.username.trim();
        let outcome = validator.validate(login, &creds.password).await;
        let identity = match outcome {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                self.reset();
                return Err(LoginError::InvalidCredentials);
            }
            Err(e) => {
                tracing::warn!(target: "tenderguard::auth", user = login, error = %e, "login failed");
                self.reset();
                return Err(e);
            }
        };
        if !identity.is_active {
            tracing::debug!(target: "tenderguard::auth", user = login, "login rejected: account inactive");
            self.reset();
            return Err(LoginError::InvalidCredentials);
        }

        let state = SessionState::authenticated(identity);
        let pages = state.index.len();
        self.state = state;
        self.persist();
        tracing::info!(target: "tenderguard::auth", user = login, pages, "login ok");
        Ok(())
    }

    /// Clear the in-memory state and the persisted entry.
    pub fn logout(&mut self) {
        if let Some(id) = self.state.identity.as_ref() {
            tprintln!("session.logout user={}", id.username);
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.state = SessionState::default();
        if let Err(e) = self.store.clear() {
            tracing::warn!(target: "tenderguard::session", error = %e, "failed to clear persisted session");
        }
    }

    fn persist(&self) {
        let Some(identity) = self.state.identity.clone() else { return; };
        let saved = PersistedSession::new(identity, self.state.authenticated);
        if let Err(e) = self.store.save(&saved) {
            tracing::warn!(target: "tenderguard::session", error = %e, "failed to persist session");
        }
    }

    pub fn is_authenticated(&self) -> bool { self.state.authenticated }

    pub fn identity(&self) -> Option<&Identity> { self.state.identity.as_ref() }

    /// Identity, only while the session is authenticated.
    pub fn authenticated_identity(&self) -> Option<&Identity> {
        if self.state.authenticated { self.state.identity.as_ref() } else { None }
    }

    pub fn permission_tokens(&self) -> &[String] {
        self.state.identity.as_ref().map(|i| i.permission_tokens()).unwrap_or(&[])
    }

    pub fn index(&self) -> &PermissionIndex { &self.state.index }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
