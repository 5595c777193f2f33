use super::*;
use crate::identity::RoleAssignment;
use tempfile::tempdir;

fn sample() -> PersistedSession {
    let id = Identity::new("u-1", "alice").with_role(RoleAssignment::new("Evaluator", &["Dashboard_read"]));
    PersistedSession::new(id, true)
}

#[test]
fn memory_store_save_load_clear() {
    let store = MemorySessionStore::default();
    assert!(store.load().unwrap().is_none());
    let s = sample();
    store.save(&s).unwrap();
    assert_eq!(store.load().unwrap(), Some(s));
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    store.clear().unwrap();
}

#[test]
fn file_store_round_trip_creates_parent_dirs() {
    let tmp = tempdir().unwrap();
    let store = FileSessionStore::new(tmp.path().join("nested").join("session.json"));
    assert!(store.load().unwrap().is_none());
    let s = sample();
    store.save(&s).unwrap();
    assert!(store.path().exists());
    assert_eq!(store.load().unwrap(), Some(s));
}

#[test]
fn file_store_never_writes_an_index() {
    let tmp = tempdir().unwrap();
    let store = FileSessionStore::new(tmp.path().join("session.json"));
    store.save(&sample()).unwrap();
    let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&"identity") && keys.contains(&"is_authenticated") && keys.contains(&"saved_at"));
}

#[test]
fn file_store_clear_is_idempotent() {
    let tmp = tempdir().unwrap();
    let store = FileSessionStore::new(tmp.path().join("session.json"));
    store.save(&sample()).unwrap();
    store.clear().unwrap();
    assert!(!store.path().exists());
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn file_store_reports_corruption() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();
    let store = FileSessionStore::new(&path);
    match store.load() {
        Err(StoreError::Json { .. }) => {}
        other => panic!("expected json error, got {:?}", other),
    }
}

#[test]
fn empty_file_reads_as_empty_store() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("session.json");
    std::fs::write(&path, "  \n").unwrap();
    assert!(FileSessionStore::new(&path).load().unwrap().is_none());
}
