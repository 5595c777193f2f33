use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::access::AccessType;
use super::alias::normalize_page_name;
use super::token::{parse_token, Grant};

/// Page -> allowed access types, derived from a role's raw token list.
///
/// Built in one pass at login and never patched afterwards; a new token list means a new index.
/// Ordered collections keep iteration (and serialized output) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionIndex {
    pages: BTreeMap<String, BTreeSet<AccessType>>,
}

impl PermissionIndex {
    pub fn build<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut index = Self::default();
        let mut skipped = 0usize;
        for raw in tokens {
            match parse_token(raw.as_ref()) {
                Some(grant) => index.insert(grant.normalized()),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(target: "tenderguard::permission", skipped, pages = index.pages.len(), "permission index built with malformed tokens ignored");
        }
        index
    }

    pub fn from_grants<I: IntoIterator<Item = Grant>>(grants: I) -> Self {
        let mut index = Self::default();
        for g in grants { index.insert(g.normalized()); }
        index
    }

    // Idempotent: a repeated access type leaves the set unchanged.
    fn insert(&mut self, grant: Grant) {
        self.pages.entry(grant.page).or_default().insert(grant.access);
    }

    /// Access types recorded for `page` after normalization. Key lookup is exact.
    pub fn get(&self, page: &str) -> Option<&BTreeSet<AccessType>> {
        self.pages.get(&normalize_page_name(page))
    }

    pub fn contains(&self, page: &str, access: AccessType) -> bool {
        self.get(page).map(|set| set.contains(&access)).unwrap_or(false)
    }

    /// Flatten back into grants, one per (page, access) pair.
    pub fn grants(&self) -> impl Iterator<Item = Grant> + '_ {
        self.pages
            .iter()
            .flat_map(|(page, set)| set.iter().map(move |a| Grant::new(page.clone(), *a)))
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize { self.pages.len() }

    pub fn is_empty(&self) -> bool { self.pages.is_empty() }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
