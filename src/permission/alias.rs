use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Known misspellings and aliases found in authored role definitions, mapped to the canonical page label.
/// Every value must itself be absent from the key set so that normalization stays idempotent.
pub const PAGE_ALIASES: &[(&str, &str)] = &[
    ("Dashboad", "Dashboard"),
    ("Admin Panel", "Admin panel"),
    ("AdminPanel", "Admin panel"),
];

static ALIAS_TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| PAGE_ALIASES.iter().copied().collect());

/// Canonicalize a page name. Lookup is exact and case-sensitive on the trimmed input;
/// names outside the alias table are returned trimmed but otherwise unchanged.
pub fn normalize_page_name(name: &str) -> String {
    let trimmed = name.trim();
    match ALIAS_TABLE.get(trimmed) {
        Some(canonical) => (*canonical).to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
#[path = "alias_tests.rs"]
mod tests;
