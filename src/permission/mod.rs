//! Page permission model: token grammar, page-name aliases, the derived index
//! and the single matching routine shared by every authorization pass.
//! Raw `"<Page>_<access>"` strings stop at the parser; everything past it works on [`Grant`].

mod access;
mod alias;
mod index;
mod matcher;
mod token;

pub use access::{AccessType, UnknownAccessType};
pub use alias::{normalize_page_name, PAGE_ALIASES};
pub use index::PermissionIndex;
pub use matcher::{is_admin_page, matches};
pub use token::{parse_token, parse_tokens, Grant};
