use serde::{Deserialize, Serialize};

use super::authorizer::role_rank;

/// Role bundle attached to an identity. Tokens keep their authored order for audit display;
/// the order carries no meaning for authorization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role_name: String,
    #[serde(default)]
    pub permission_tokens: Vec<String>,
}

impl RoleAssignment {
    pub fn new<S: Into<String>>(role_name: S, tokens: &[&str]) -> Self {
        Self { role_name: role_name.into(), permission_tokens: tokens.iter().map(|t| t.to_string()).collect() }
    }
}

fn default_active() -> bool { true }

/// An authenticated principal as returned by the identity-validation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Single active role; a list only for forward compatibility. Only the first entry is consulted.
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub department_id: Option<String>,
}

impl Identity {
    pub fn new<S: Into<String>>(id: S, username: S) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
            roles: Vec::new(),
            is_active: true,
            department_id: None,
        }
    }

    pub fn with_role(mut self, role: RoleAssignment) -> Self {
        self.roles = vec![role];
        self
    }

    pub fn with_department<S: Into<String>>(mut self, department_id: S) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    pub fn role(&self) -> Option<&RoleAssignment> { self.roles.first() }

    pub fn role_name(&self) -> Option<&str> { self.role().map(|r| r.role_name.as_str()) }

    /// Raw permission tokens of the active role, empty when no role is attached.
    pub fn permission_tokens(&self) -> &[String] {
        self.role().map(|r| r.permission_tokens.as_slice()).unwrap_or(&[])
    }

    /// "First Last" when either part is present, otherwise the username.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() { self.username.clone() } else { parts.join(" ") }
    }

    /// Department scoping; blank counts as unassigned.
    pub fn department(&self) -> Option<&str> {
        self.department_id.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    pub fn role_rank(&self) -> u8 { self.role_name().map(role_rank).unwrap_or(0) }

    /// Login identifier match: trimmed, case-insensitive, against username or email.
    pub fn matches_login(&self, login: &str) -> bool {
        let wanted = login.trim().to_lowercase();
        if wanted.is_empty() { return false; }
        self.username.trim().to_lowercase() == wanted
            || self.email.as_deref().map(|e| e.trim().to_lowercase() == wanted).unwrap_or(false)
    }
}
