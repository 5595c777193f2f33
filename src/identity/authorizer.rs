//! Page authorization for a [`Session`], plus the department and role-rank helpers.

use serde::Serialize;

use crate::permission::{is_admin_page, matches, parse_tokens, AccessType};

use super::principal::Identity;
use super::session::Session;

/// Outcome of a page check with a short machine-readable reason, useful in logs and API replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: &'static str,
}

fn allow(reason: &'static str) -> AccessDecision { AccessDecision { allowed: true, reason } }
fn deny(reason: &'static str) -> AccessDecision { AccessDecision { allowed: false, reason } }

impl Session {
    /// Resolve `access` on `page` in priority order: raw role tokens, then the derived index,
    /// then (non-admin pages only) read access for any authenticated identity.
    ///
    /// Total: never panics and never errors; unknown pages simply fall through to the fallback rules.
    pub fn decide(&self, page: &str, access: AccessType) -> AccessDecision {
        let Some(identity) = self.authenticated_identity() else { return deny("not_authenticated"); };
        if identity.role().is_none() { return deny("no_role"); }
        if page.trim().is_empty() { return deny("empty_page"); }

        // Both passes are kept; the raw pass guards against a stale or mis-built index.
        if self.raw_token_allows(page, access) { return allow("raw_token"); }
        if self.index_allows(page, access) { return allow("index"); }

        if is_admin_page(page) { return deny("admin_requires_grant"); }
        if access == AccessType::Read { return allow("authenticated_read"); }
        deny("no_grant")
    }

    pub fn has_page_access(&self, page: &str, access: AccessType) -> bool {
        let d = self.decide(page, access);
        tracing::trace!(target: "tenderguard::authz", page, access = %access, allowed = d.allowed, reason = d.reason);
        d.allowed
    }

    /// String-typed variant for callers at the HTTP/CLI boundary. Unknown access strings deny.
    pub fn check(&self, page: &str, access: &str) -> bool {
        match access.parse::<AccessType>() {
            Ok(a) => self.has_page_access(page, a),
            Err(_) => false,
        }
    }

    pub fn can_read_page(&self, page: &str) -> bool { self.has_page_access(page, AccessType::Read) }

    pub fn can_write_page(&self, page: &str) -> bool { self.has_page_access(page, AccessType::Write) }

    pub fn can_update_page(&self, page: &str) -> bool { self.has_page_access(page, AccessType::Update) }

    pub fn can_delete_page(&self, page: &str) -> bool { self.has_page_access(page, AccessType::Delete) }

    /// Grant lookup against the identity's raw tokens, parsed on demand.
    pub fn raw_token_allows(&self, page: &str, access: AccessType) -> bool {
        matches(parse_tokens(self.permission_tokens()), page, access)
    }

    /// Grant lookup against the index built at login.
    pub fn index_allows(&self, page: &str, access: AccessType) -> bool {
        matches(self.index().grants(), page, access)
    }

    pub fn can_access_department(&self, department_id: &str) -> bool {
        match self.authenticated_identity() {
            Some(identity) => department_allowed(identity, department_id),
            None => false,
        }
    }
}

/// Admins (role name exactly "Admin") and identities without a department see every department;
/// everyone else only their own. No hierarchy between departments.
pub fn department_allowed(identity: &Identity, department_id: &str) -> bool {
    if identity.role_name() == Some("Admin") {
        return true;
    }
    match identity.department() {
        None => true,
        Some(own) => own == department_id,
    }
}

/// Lexical rank used for display ordering only: admin 3, manager 2, user 1, anything else 0.
/// Unrelated role names can tie.
pub fn role_rank(role_name: &str) -> u8 {
    let lower = role_name.to_lowercase();
    if lower.contains("admin") {
        3
    } else if lower.contains("manager") {
        2
    } else if lower.contains("user") {
        1
    } else {
        0
    }
}

#[cfg(test)]
#[path = "authorizer_tests.rs"]
mod tests;
