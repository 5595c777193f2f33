use super::*;
use crate::identity::RoleAssignment;
use crate::storage::FileSessionStore;
use tempfile::tempdir;

fn evaluator(tokens: &[&str]) -> Identity {
    Identity::new("u-1", "alice").with_role(RoleAssignment::new("Evaluator", tokens))
}

fn directory_of(identity: Identity) -> impl Fn(&str, &str) -> Result<Option<Identity>, LoginError> + Send + Sync {
    move |user: &str, pass: &str| -> Result<Option<Identity>, LoginError> {
        if identity.matches_login(user) && pass == "pw" { Ok(Some(identity.clone())) } else { Ok(None) }
    }
}

#[tokio::test]
async fn login_populates_identity_and_index() {
    let mut s = Session::in_memory();
    assert!(!s.is_authenticated());
    s.login(&Credentials::new("alice", "pw"), &directory_of(evaluator(&["Dashboard_read", "Dashboad_write"]))).await.unwrap();
    assert!(s.is_authenticated());
    assert_eq!(s.identity().map(|i| i.username.as_str()), Some("alice"));
    assert_eq!(s.permission_tokens().len(), 2);
    let pages: Vec<&str> = s.index().pages().collect();
    assert_eq!(pages, vec!["Dashboard"]);
}

#[tokio::test]
async fn username_is_trimmed_before_validation() {
    let mut s = Session::in_memory();
    let seen = std::sync::Mutex::new(String::new());
    let v = |user: &str, _: &str| -> Result<Option<Identity>, LoginError> {
        *seen.lock().unwrap() = user.to_string();
        Ok(Some(evaluator(&[])))
    };
    s.login(&Credentials::new("  alice  ", "pw"), &v).await.unwrap();
    assert_eq!(&*seen.lock().unwrap(), "alice");
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let mut s = Session::in_memory();
    let err = s.login(&Credentials::new("alice", "nope"), &directory_of(evaluator(&[]))).await.unwrap_err();
    assert!(matches!(err, LoginError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!s.is_authenticated());
    assert!(s.identity().is_none());
}

#[tokio::test]
async fn inactive_identity_is_rejected_even_with_valid_credentials() {
    let mut inactive = evaluator(&["Dashboard_read"]);
    inactive.is_active = false;
    let mut s = Session::in_memory();
    let err = s.login(&Credentials::new("alice", "pw"), &directory_of(inactive)).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!s.is_authenticated());
    assert!(!s.can_read_page("Dashboard"));
    assert!(!s.can_read_page("Anything"));
}

#[tokio::test]
async fn configuration_errors_are_distinct() {
    let v = |_: &str, _: &str| -> Result<Option<Identity>, LoginError> { Err(LoginError::NotConfigured("no users".into())) };
    let mut s = Session::in_memory();
    let err = s.login(&Credentials::new("alice", "pw"), &v).await.unwrap_err();
    assert!(matches!(err, LoginError::NotConfigured(_)));
}

#[tokio::test]
async fn failed_login_clears_a_previous_session() {
    let mut s = Session::in_memory();
    let v = directory_of(evaluator(&["Dashboard_read"]));
    s.login(&Credentials::new("alice", "pw"), &v).await.unwrap();
    assert!(s.is_authenticated());
    assert!(s.login(&Credentials::new("alice", "bad"), &v).await.is_err());
    assert!(!s.is_authenticated());
    assert!(s.index().is_empty());
}

#[tokio::test]
async fn second_login_replaces_state_wholesale() {
    let mut s = Session::in_memory();
    s.login(&Credentials::new("alice", "pw"), &directory_of(evaluator(&["Reports_write"]))).await.unwrap();
    let bob = Identity::new("u-2", "bob").with_role(RoleAssignment::new("User", &["Dashboard_read"]));
    s.login(&Credentials::new("bob", "pw"), &directory_of(bob)).await.unwrap();
    assert_eq!(s.identity().unwrap().username, "bob");
    assert!(s.index().get("Reports").is_none());
    assert!(!s.can_write_page("Reports"));
}

#[tokio::test]
async fn restore_rebuilds_index_from_persisted_identity() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("session.json");
    let v = directory_of(evaluator(&["Dashboard_read", "Dashboard_write", "AdminPanel_read"]));

    let mut first = Session::new(Arc::new(FileSessionStore::new(&path)));
    first.login(&Credentials::new("alice", "pw"), &v).await.unwrap();

    let reloaded = Session::restore(Arc::new(FileSessionStore::new(&path))).unwrap();
    assert!(reloaded.is_authenticated());
    assert_eq!(reloaded.index(), first.index());
    for page in ["Dashboard", "Admin Panel", "Reports", "Admin Settings"] {
        for a in crate::permission::AccessType::ALL {
            assert_eq!(reloaded.has_page_access(page, a), first.has_page_access(page, a), "{} {}", page, a);
        }
    }
}

#[tokio::test]
async fn logout_clears_memory_and_persisted_entry() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("session.json");
    let mut s = Session::new(Arc::new(FileSessionStore::new(&path)));
    s.login(&Credentials::new("alice", "pw"), &directory_of(evaluator(&["Dashboard_read"]))).await.unwrap();
    assert!(path.exists());

    s.logout();
    assert!(!s.is_authenticated());
    assert!(s.identity().is_none());
    assert!(!path.exists());

    let reloaded = Session::restore(Arc::new(FileSessionStore::new(&path))).unwrap();
    assert!(!reloaded.is_authenticated());
    assert!(!reloaded.can_read_page("Dashboard"));
}

#[test]
fn restore_skips_unauthenticated_or_inactive_entries() {
    let store = Arc::new(MemorySessionStore::default());
    store.save(&PersistedSession::new(evaluator(&["Dashboard_read"]), false)).unwrap();
    assert!(!Session::restore(store.clone()).unwrap().is_authenticated());

    let mut inactive = evaluator(&["Dashboard_read"]);
    inactive.is_active = false;
    store.save(&PersistedSession::new(inactive, true)).unwrap();
    assert!(!Session::restore(store).unwrap().is_authenticated());
}

#[test]
fn fresh_session_denies_everything() {
    let s = Session::in_memory();
    assert!(!s.can_read_page("Dashboard"));
    assert!(!s.can_access_department("d1"));
    assert!(s.authenticated_identity().is_none());
}
