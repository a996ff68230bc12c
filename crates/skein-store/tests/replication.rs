//! Integration tests for sessions replicated through the memory store.
//!
//! Each test plays two "nodes" sharing one store: one mutates a session,
//! the other loads it and checks what it can see.

use std::sync::Arc;

use serde_json::json;
use skein_session::{AttributeStore, Invalidatable, Principal, SessionConfig};
use skein_store::{MemoryStore, StoreConfig};

fn buffered() -> MemoryStore {
    MemoryStore::new(StoreConfig::new(), Arc::new(SessionConfig::default()))
}

fn save_on_change() -> MemoryStore {
    MemoryStore::new(
        StoreConfig::new().with_save_on_change(true),
        Arc::new(SessionConfig::default()),
    )
}

#[test]
fn test_buffered_changes_visible_after_flush() {
    let store = buffered();
    let mut session = store.create_session().unwrap();
    let id = session.id().unwrap().to_string();

    session.set_attribute("cart", json!([1, 2])).unwrap();

    let peer = store.load(&id).unwrap().unwrap();
    assert_eq!(peer.get_attribute("cart").unwrap(), None);

    assert!(store.flush(&mut session).unwrap());
    assert!(!session.is_dirty());

    let peer = store.load(&id).unwrap().unwrap();
    assert_eq!(peer.get_attribute("cart").unwrap(), Some(&json!([1, 2])));
}

#[test]
fn test_flush_skips_clean_session() {
    let store = buffered();
    let mut session = store.create_session().unwrap();

    assert!(!store.flush(&mut session).unwrap());
    assert_eq!(store.stats().saves, 0);
}

#[test]
fn test_always_save_flushes_clean_session() {
    let store = MemoryStore::new(
        StoreConfig::new().with_always_save(true),
        Arc::new(SessionConfig::default()),
    );
    let mut session = store.create_session().unwrap();

    assert!(store.flush(&mut session).unwrap());
    assert_eq!(store.stats().saves, 1);
}

#[test]
fn test_save_on_change_is_immediately_visible() {
    let store = save_on_change();
    let mut session = store.create_session().unwrap();
    let id = session.id().unwrap().to_string();

    session.set_attribute("user", json!("alice")).unwrap();
    assert!(!session.is_dirty());
    assert_eq!(store.stats().saves, 1);

    let peer = store.load(&id).unwrap().unwrap();
    assert_eq!(peer.get_attribute("user").unwrap(), Some(&json!("alice")));

    session.remove_attribute("user").unwrap();
    assert_eq!(store.stats().saves, 2);
    let peer = store.load(&id).unwrap().unwrap();
    assert_eq!(peer.get_attribute("user").unwrap(), None);
}

#[test]
fn test_loaded_session_is_bound_and_clean() {
    let store = save_on_change();
    let session = store.create_session().unwrap();
    let id = session.id().unwrap().to_string();

    let mut peer = store.load(&id).unwrap().unwrap();
    assert!(!peer.is_dirty());
    assert!(peer.store().is_some());

    peer.set_attribute("seen", json!(true)).unwrap();
    let again = store.load(&id).unwrap().unwrap();
    assert_eq!(again.get_attribute("seen").unwrap(), Some(&json!(true)));
}

#[test]
fn test_principal_replicates_at_save_point() {
    let store = buffered();
    let mut session = store.create_session().unwrap();
    let id = session.id().unwrap().to_string();

    session.set_principal(Some(Principal::new("alice").with_role("admin")));
    assert!(store.flush(&mut session).unwrap());

    let peer = store.load(&id).unwrap().unwrap();
    assert_eq!(peer.principal().unwrap().roles, vec!["admin".to_string()]);
}

#[test]
fn test_creation_time_survives_replication() {
    let store = buffered();
    let mut session = store.create_session().unwrap();
    let id = session.id().unwrap().to_string();
    session.set_creation_time(1_700_000_000_000);
    session.set_attribute("a", json!(1)).unwrap();
    session.set_attribute("b", json!("x")).unwrap();
    store.flush(&mut session).unwrap();

    let peer = store.load(&id).unwrap().unwrap();
    assert_eq!(peer.creation_time(), 1_700_000_000_000);
    assert_eq!(peer.get_attribute("a").unwrap(), Some(&json!(1)));
    assert_eq!(peer.get_attribute("b").unwrap(), Some(&json!("x")));
}

#[test]
fn test_id_reassignment_moves_record() {
    let store = MemoryStore::new(
        StoreConfig::new(),
        Arc::new(SessionConfig::default().with_monitor_destroyed_sessions(true)),
    );
    let mut session = store.create_session().unwrap();
    let old_id = session.id().unwrap().to_string();
    assert!(store.contains(&old_id));

    session.set_id("rotated").unwrap();
    assert!(!store.contains(&old_id));
    assert!(store.contains("rotated"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_id_reassignment_unmonitored_leaves_store_alone() {
    let store = buffered();
    let mut session = store.create_session().unwrap();
    let old_id = session.id().unwrap().to_string();

    session.set_id("rotated").unwrap();
    assert!(store.contains(&old_id));
    assert!(!store.contains("rotated"));
}

#[test]
fn test_invalidate_drops_record() {
    let store = buffered();
    let mut session = store.create_session().unwrap();
    let id = session.id().unwrap().to_string();

    session.invalidate().unwrap();
    assert!(!store.contains(&id));
    assert!(store.load(&id).unwrap().is_none());
    assert!(store.is_empty());
}

#[test]
fn test_manual_dirty_signal_triggers_flush() {
    let store = MemoryStore::new(
        StoreConfig::new(),
        Arc::new(SessionConfig::default().with_manual_dirty_tracking(true)),
    );
    let mut session = store.create_session().unwrap();

    session.set_attribute("__changed__", json!(1)).unwrap();
    assert!(store.flush(&mut session).unwrap());
    assert_eq!(store.list_ids().len(), 1);
}
