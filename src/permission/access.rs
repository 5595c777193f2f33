use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operation a grant allows on a page. Serialized lowercase, matching the token suffix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Read,
    Write,
    Update,
    Delete,
}

impl AccessType {
    pub const ALL: [AccessType; 4] = [AccessType::Read, AccessType::Write, AccessType::Update, AccessType::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Read => "read",
            AccessType::Write => "write",
            AccessType::Update => "update",
            AccessType::Delete => "delete",
        }
    }
}

impl Default for AccessType {
    fn default() -> Self { AccessType::Read }
}

impl Display for AccessType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown access type '{0}'")]
pub struct UnknownAccessType(pub String);

impl FromStr for AccessType {
    type Err = UnknownAccessType;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(AccessType::Read),
            "write" => Ok(AccessType::Write),
            "update" => Ok(AccessType::Update),
            "delete" => Ok(AccessType::Delete),
            other => Err(UnknownAccessType(other.to_string())),
        }
    }
}
