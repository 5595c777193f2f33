use async_trait::async_trait;
use serde::Deserialize;

use super::principal::Identity;

/// Failure at the login boundary. Credential problems are deliberately collapsed into one
/// variant so callers cannot tell an unknown user from a wrong password.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("identity validation is not configured: {0}")]
    NotConfigured(String),
    #[error("user directory unavailable: {0}")]
    Directory(String),
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("username", &self.username).field("password", &"<redacted>").finish()
    }
}

/// External collaborator that checks credentials and returns the matching identity.
/// `Ok(None)` means the credentials did not match.
#[async_trait]
pub trait IdentityValidator: Send + Sync {
    async fn validate(&self, username: &str, password: &str) -> Result<Option<Identity>, LoginError>;
}

/// Plain functions and closures can stand in for a validator.
#[async_trait]
impl<F> IdentityValidator for F
where
    F: Fn(&str, &str) -> Result<Option<Identity>, LoginError> + Send + Sync,
{
    async fn validate(&self, username: &str, password: &str) -> Result<Option<Identity>, LoginError> {
        (self)(username, password)
    }
}
