//! Identity and session management for the console.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod authorizer;

pub use principal::{Identity, RoleAssignment};
pub use session::Session;
pub use provider::{Credentials, IdentityValidator, LoginError};
pub use authorizer::{AccessDecision, department_allowed, role_rank};
