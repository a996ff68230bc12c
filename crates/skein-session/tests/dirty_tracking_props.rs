//! Property tests for dirty tracking.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::{Value, json};
use skein_session::{
    AttributeStore, DirtyAwareStore, Result, Session, SessionConfig, SessionStore, is_change,
};

/// Counts synchronous saves.
#[derive(Default)]
struct CountingStore {
    saves: Mutex<usize>,
}

impl SessionStore for CountingStore {
    fn add(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn as_dirty_aware(&self) -> Option<&dyn DirtyAwareStore> {
        Some(self)
    }
}

impl DirtyAwareStore for CountingStore {
    fn save_on_change(&self) -> bool {
        true
    }

    fn save(&self, session: &mut Session, _synchronous: bool) -> Result<()> {
        *self.saves.lock() += 1;
        session.reset_dirty_tracking();
        Ok(())
    }
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (0i64..4).prop_map(|n| json!(n)),
        "[ab]{0,2}".prop_map(Value::String),
    ]
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[abc]"
}

fn writes_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec((key_strategy(), value_strategy()), 0..24)
}

fn config() -> Arc<SessionConfig> {
    Arc::new(SessionConfig::default())
}

proptest! {
    /// Property: rewriting the current values never marks the session dirty.
    #[test]
    fn unchanged_writes_stay_clean(writes in writes_strategy()) {
        let mut session = Session::new(config());
        for (key, value) in &writes {
            session.set_attribute(key, value.clone()).unwrap();
        }
        session.reset_dirty_tracking();

        let current: Vec<(String, Value)> = session
            .attribute_names()
            .unwrap()
            .into_iter()
            .map(|k| {
                let v = session.get_attribute(&k).unwrap().cloned().unwrap();
                (k, v)
            })
            .collect();
        for (key, value) in current {
            session.set_attribute(&key, value).unwrap();
        }
        prop_assert!(!session.is_dirty());
    }

    /// Property: under buffered policy the buffer holds each written key's final value.
    #[test]
    fn buffered_changes_hold_final_value(writes in writes_strategy()) {
        let mut session = Session::new(config());
        let mut last = HashMap::new();
        for (key, value) in &writes {
            session.set_attribute(key, value.clone()).unwrap();
            last.insert(key.clone(), value.clone());
        }

        prop_assert_eq!(session.is_dirty(), !writes.is_empty());
        prop_assert_eq!(session.changed_attributes().len(), last.len());
        for (key, value) in last {
            prop_assert_eq!(&session.changed_attributes()[&key], &Some(value));
        }
    }

    /// Property: under save-on-change there is exactly one save per changing write.
    #[test]
    fn save_on_change_saves_per_change(writes in writes_strategy()) {
        let store = Arc::new(CountingStore::default());
        let mut session = Session::with_store(config(), store.clone());
        let mut model: HashMap<String, Value> = HashMap::new();
        let mut expected = 0;

        for (key, value) in &writes {
            if is_change(model.get(key), Some(value)) {
                expected += 1;
            }
            model.insert(key.clone(), value.clone());
            session.set_attribute(key, value.clone()).unwrap();
            prop_assert!(session.changed_attributes().is_empty());
        }

        prop_assert_eq!(*store.saves.lock(), expected);
    }

    /// Property: reset always restores a clean state.
    #[test]
    fn reset_always_cleans(writes in writes_strategy(), removals in prop::collection::vec(key_strategy(), 0..4)) {
        let mut session = Session::new(config());
        for (key, value) in &writes {
            session.set_attribute(key, value.clone()).unwrap();
        }
        for key in &removals {
            session.remove_attribute(key).unwrap();
        }

        session.reset_dirty_tracking();
        prop_assert!(!session.is_dirty());
        prop_assert!(session.changed_attributes().is_empty());
    }
}
