use serde::{Deserialize, Serialize};

use super::access::AccessType;
use super::alias::normalize_page_name;

/// One (page, access) pair decoded from a role's permission token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Grant {
    pub page: String,
    pub access: AccessType,
}

impl Grant {
    pub fn new<S: Into<String>>(page: S, access: AccessType) -> Self {
        Self { page: page.into(), access }
    }

    /// Same grant with its page name passed through the alias table.
    pub fn normalized(self) -> Self {
        Self { page: normalize_page_name(&self.page), access: self.access }
    }

    /// Token form, `"<page>_<access>"`.
    pub fn to_token(&self) -> String {
        format!("{}_{}", self.page, self.access)
    }
}

/// Decode a `"<Page Name>_<access>"` token.
///
/// The split happens at the last underscore so page names may contain underscores
/// (`"Finance_Report_write"` is page `Finance_Report`). Both halves are trimmed and the
/// access half is matched case-insensitively. Returns `None` for tokens without an
/// underscore, with an empty half, or with an access type outside read/write/update/delete.
/// The page name is returned as written; see [`Grant::normalized`].
pub fn parse_token(token: &str) -> Option<Grant> {
    let (page, access) = token.rsplit_once('_')?;
    let page = page.trim();
    let access = access.trim().to_lowercase();
    if page.is_empty() || access.is_empty() {
        return None;
    }
    let access = access.parse::<AccessType>().ok()?;
    Some(Grant { page: page.to_string(), access })
}

/// Parse and normalize a raw token list, silently skipping anything malformed.
pub fn parse_tokens<'a, S: AsRef<str>>(tokens: &'a [S]) -> impl Iterator<Item = Grant> + 'a {
    tokens
        .iter()
        .filter_map(|t| parse_token(t.as_ref()))
        .map(Grant::normalized)
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
