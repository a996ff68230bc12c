//! Replicated session with dirty tracking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::attribute;
use crate::base::{AttributeStore, BaseSession, Invalidatable, Principal};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::persistence::SessionStore;

/// A session whose mutations are tracked for replication.
///
/// Every attribute write, removal, principal change and id change passes
/// through here. Each one either records the change for the next save point
/// or, when the bound store runs a save-on-change policy, persists the
/// session before returning.
///
/// `Session` does no locking of its own; the container serializes access to
/// a given session.
pub struct Session {
    base: BaseSession,

    /// Writes since the last reset, keyed by attribute name. `None` records
    /// a write that cleared the attribute.
    changed_attributes: HashMap<String, Option<Value>>,

    /// Set for changes that are not attribute-keyed.
    dirty: bool,

    config: Arc<SessionConfig>,

    store: Option<Arc<dyn SessionStore>>,
}

impl Session {
    /// Create a fresh, clean session not bound to any store.
    pub fn new(config: Arc<SessionConfig>) -> Self {
        let base = BaseSession::new(config.max_inactive_interval_secs);
        Self::from_base(base, config)
    }

    /// Create a fresh, clean session bound to `store`.
    pub fn with_store(config: Arc<SessionConfig>, store: Arc<dyn SessionStore>) -> Self {
        let mut session = Self::new(config);
        session.store = Some(store);
        session
    }

    /// Wrap existing base state. The result starts clean.
    pub(crate) fn from_base(base: BaseSession, config: Arc<SessionConfig>) -> Self {
        let mut session = Self {
            base,
            changed_attributes: HashMap::new(),
            dirty: false,
            config,
            store: None,
        };
        session.reset_dirty_tracking();
        session
    }

    /// Bind the session to a store without any store interaction.
    pub fn bind(&mut self, store: Arc<dyn SessionStore>) {
        self.store = Some(store);
    }

    /// Store this session is bound to, if any.
    pub fn store(&self) -> Option<&Arc<dyn SessionStore>> {
        self.store.as_ref()
    }

    /// Tracking configuration shared by every session.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Underlying base state.
    pub fn base(&self) -> &BaseSession {
        &self.base
    }

    // ── Dirty tracking ──────────────────────────────────────────────────

    /// Forget every recorded change.
    pub fn reset_dirty_tracking(&mut self) {
        self.changed_attributes.clear();
        self.dirty = false;
    }

    /// Whether anything changed since the last reset.
    pub fn is_dirty(&self) -> bool {
        self.dirty || !self.changed_attributes.is_empty()
    }

    /// Buffered attribute changes since the last reset.
    ///
    /// This is a view of the live buffer; it cannot change while borrowed.
    pub fn changed_attributes(&self) -> &HashMap<String, Option<Value>> {
        &self.changed_attributes
    }

    /// Persist through the bound store if it runs save-on-change.
    ///
    /// Returns whether a save happened. A failed save leaves the session
    /// marked dirty so the next save point still ships the write.
    fn save_if_save_on_change(&mut self) -> Result<bool> {
        let Some(store) = self.store.clone() else {
            return Ok(false);
        };
        match store.as_dirty_aware() {
            Some(aware) if aware.save_on_change() => {
                debug!(session_id = ?self.base.id, "Saving session on change");
                if let Err(err) = aware.save(self, true) {
                    warn!(session_id = ?self.base.id, error = %err, "Save on change failed");
                    self.dirty = true;
                    return Err(err);
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // ── Identity ────────────────────────────────────────────────────────

    /// Current id, or `None` before one is assigned.
    pub fn id(&self) -> Option<&str> {
        self.base.id()
    }

    /// Reassign the session id.
    ///
    /// With destruction monitoring enabled, the store drops the old id
    /// before the assignment and registers the new one after it.
    pub fn set_id(&mut self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        let store = if self.config.monitor_destroyed_sessions {
            self.store.clone()
        } else {
            None
        };

        if let Some(store) = &store
            && self.base.id.is_some()
        {
            store.remove(self)?;
        }

        debug!(old_id = ?self.base.id, new_id = %id, "Session id reassigned");
        self.base.set_id(Some(id));

        if let Some(store) = &store {
            store.add(self)?;
        }

        Ok(())
    }

    // ── Principal ───────────────────────────────────────────────────────

    /// Authenticated principal, if bound.
    pub fn principal(&self) -> Option<&Principal> {
        self.base.principal()
    }

    /// Bind or clear the authenticated principal. Always marks dirty.
    pub fn set_principal(&mut self, principal: Option<Principal>) {
        self.base.set_principal(principal);
        self.dirty = true;
    }

    // ── Base passthrough ────────────────────────────────────────────────

    /// Creation time in epoch milliseconds.
    pub fn creation_time(&self) -> i64 {
        self.base.creation_time()
    }

    /// Set the creation time. Both access times are reset to it.
    pub fn set_creation_time(&mut self, time: i64) {
        self.base.set_creation_time(time);
    }

    /// Access time before the current request (epoch ms).
    pub fn last_accessed_time(&self) -> i64 {
        self.base.last_accessed_time()
    }

    /// Idle interval in seconds.
    pub fn max_inactive_interval(&self) -> i64 {
        self.base.max_inactive_interval()
    }

    pub fn set_max_inactive_interval(&mut self, secs: i64) {
        self.base.set_max_inactive_interval(secs);
    }

    /// Whether the client has not yet joined the session.
    pub fn is_new(&self) -> bool {
        self.base.is_new()
    }

    /// Record a request touching the session at `now` (epoch ms).
    pub fn access(&mut self, now: i64) {
        self.base.access(now);
    }

    /// Whether the session has been idle past its interval at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.base.is_expired_at(now)
    }

    pub(crate) fn base_mut(&mut self) -> &mut BaseSession {
        &mut self.base
    }
}

impl AttributeStore for Session {
    fn get_attribute(&self, name: &str) -> Result<Option<&Value>> {
        self.base.get_attribute(name)
    }

    fn attribute_names(&self) -> Result<Vec<String>> {
        self.base.attribute_names()
    }

    fn set_attribute(&mut self, name: &str, value: impl Into<Option<Value>>) -> Result<()> {
        if self.config.is_manual_dirty_signal(name) {
            trace!(session_id = ?self.base.id, "Manual dirty signal");
            self.dirty = true;
            return Ok(());
        }

        let value = value.into();
        let old = self.base.replace_attribute(name, value.clone())?;
        if !attribute::is_change(old.as_ref(), value.as_ref()) {
            return Ok(());
        }

        if self.save_if_save_on_change()? {
            return Ok(());
        }

        trace!(session_id = ?self.base.id, attribute = %name, "Buffered attribute change");
        self.changed_attributes.insert(name.to_string(), value);
        Ok(())
    }

    fn remove_attribute(&mut self, name: &str) -> Result<()> {
        self.base.remove_attribute(name)?;
        if !self.save_if_save_on_change()? {
            self.dirty = true;
        }
        Ok(())
    }
}

impl Invalidatable for Session {
    fn invalidate(&mut self) -> Result<()> {
        self.base.invalidate()?;
        debug!(session_id = ?self.base.id, "Session invalidated");

        if let Some(store) = self.store.clone()
            && self.base.id.is_some()
        {
            store.remove(self)?;
        }
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.base.is_valid()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base", &self.base)
            .field("changed_attributes", &self.changed_attributes)
            .field("dirty", &self.dirty)
            .field("bound", &self.store.is_some())
            .finish()
    }
}
