use super::access::AccessType;
use super::alias::normalize_page_name;
use super::token::Grant;

/// True when any grant covers `page` with `access`. Pages are compared after
/// normalization, case-insensitively. Used for both the raw-token and the index pass.
pub fn matches<I>(grants: I, page: &str, access: AccessType) -> bool
where
    I: IntoIterator<Item = Grant>,
{
    let wanted = normalize_page_name(page).to_lowercase();
    if wanted.is_empty() {
        return false;
    }
    grants
        .into_iter()
        .any(|g| g.access == access && normalize_page_name(&g.page).to_lowercase() == wanted)
}

/// Administrative pages never receive the authenticated-read fallback.
/// The "admin panel" equality is subsumed by the substring test but kept explicit.
pub fn is_admin_page(page: &str) -> bool {
    let lower = page.to_lowercase();
    lower.contains("admin") || lower.trim() == "admin panel"
}
