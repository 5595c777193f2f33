use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const ENV_HTTP_PORT: &str = "TENDERGUARD_HTTP_PORT";
pub const ENV_USERS_FILE: &str = "TENDERGUARD_USERS_FILE";
pub const ENV_SESSION_FILE: &str = "TENDERGUARD_SESSION_FILE";
pub const ENV_ALLOW_PLAINTEXT: &str = "TENDERGUARD_ALLOW_PLAINTEXT";
pub const ENV_SESSION_TTL_SECS: &str = "TENDERGUARD_SESSION_TTL_SECS";

/// Process settings shared by the server and CLI binaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub http_port: u16,
    /// JSON user directory; `None` leaves login unconfigured.
    pub users_file: Option<PathBuf>,
    /// Where the CLI keeps its persisted session.
    pub session_file: PathBuf,
    /// Accept legacy plaintext password records.
    pub allow_plaintext_passwords: bool,
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 7878,
            users_file: None,
            session_file: PathBuf::from(".tenderguard").join("session.json"),
            allow_plaintext_passwords: false,
            session_ttl_secs: 60 * 60,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; unparsable values fall back to defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let d = Self::default();
        let http_port = get(ENV_HTTP_PORT).and_then(|s| s.trim().parse::<u16>().ok()).unwrap_or(d.http_port);
        let users_file = get(ENV_USERS_FILE).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).map(PathBuf::from);
        let session_file = get(ENV_SESSION_FILE).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).map(PathBuf::from).unwrap_or(d.session_file);
        let allow_plaintext_passwords = get(ENV_ALLOW_PLAINTEXT).and_then(|s| parse_bool(&s)).unwrap_or(d.allow_plaintext_passwords);
        let session_ttl_secs = get(ENV_SESSION_TTL_SECS).and_then(|s| s.trim().parse::<u64>().ok()).filter(|n| *n > 0).unwrap_or(d.session_ttl_secs);
        Self { http_port, users_file, session_file, allow_plaintext_passwords, session_ttl_secs }
    }

    pub fn session_ttl(&self) -> Duration { Duration::from_secs(self.session_ttl_secs) }

    /// Open the configured user directory, or an unconfigured one when no file is set.
    pub fn user_directory(&self) -> Result<crate::security::UserDirectory, crate::identity::LoginError> {
        match &self.users_file {
            Some(path) => crate::security::UserDirectory::load(path, self.allow_plaintext_passwords),
            None => Ok(crate::security::UserDirectory::unconfigured()),
        }
    }
}
