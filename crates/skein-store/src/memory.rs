//! In-process replicated session store with LRU bounding.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use skein_session::{DirtyAwareStore, Error, Result, Session, SessionConfig, SessionStore};
use tracing::{debug, trace};

use crate::config::StoreConfig;

/// A serialized session as kept by the store.
#[derive(Debug, Clone)]
pub struct StoredSession {
    /// Encoded session state.
    pub bytes: Vec<u8>,

    /// Most recent access time of the session when it was written (epoch ms).
    pub accessed_at: i64,

    /// Idle interval of the session in seconds.
    pub max_inactive_interval: i64,
}

impl StoredSession {
    fn from_session(session: &Session) -> Result<Self> {
        Ok(Self {
            bytes: session.to_bytes()?,
            accessed_at: session.base().this_accessed_time(),
            max_inactive_interval: session.max_inactive_interval(),
        })
    }

    /// Whether the record has been idle longer than its interval at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.max_inactive_interval > 0
            && now.saturating_sub(self.accessed_at)
                > self.max_inactive_interval.saturating_mul(1000)
    }
}

/// Inner state protected by RwLock.
struct StoreInner {
    /// LRU map of session id to record.
    records: LruCache<String, StoredSession>,

    /// Number of successful saves.
    saves: u64,

    /// Number of records dropped to make room.
    evictions: u64,
}

/// Session store keeping encoded sessions in memory.
///
/// This is a cheap-to-clone handle; clones share the same records. Sessions
/// created or loaded through the store are bound to it, so their mutations
/// call back into [`SessionStore`] and [`DirtyAwareStore`].
///
/// With `save_on_change` off, callers flush sessions at their save points
/// with [`MemoryStore::flush`].
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
    config: StoreConfig,
    session_config: Arc<SessionConfig>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig, session_config: Arc<SessionConfig>) -> Self {
        let cap = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);

        let inner = StoreInner {
            records: LruCache::new(cap),
            saves: 0,
            evictions: 0,
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
            config,
            session_config,
        }
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Tracking configuration given to sessions this store creates or loads.
    pub fn session_config(&self) -> &Arc<SessionConfig> {
        &self.session_config
    }

    /// A handle to this store for binding sessions.
    pub fn handle(&self) -> Arc<dyn SessionStore> {
        Arc::new(self.clone())
    }

    /// Create a session with a fresh id, bound to this store and recorded.
    pub fn create_session(&self) -> Result<Session> {
        let mut session = Session::with_store(Arc::clone(&self.session_config), self.handle());
        session.set_id(uuid::Uuid::new_v4().to_string())?;

        // With monitoring on, set_id already registered the record.
        if !self.session_config.monitor_destroyed_sessions {
            self.add(&session)?;
        }

        debug!(session_id = ?session.id(), "Session created");
        Ok(session)
    }

    /// Load a session by id, bound to this store.
    ///
    /// Returns `Ok(None)` if no record exists.
    pub fn load(&self, session_id: &str) -> Result<Option<Session>> {
        let bytes = {
            let mut inner = self.inner.write();
            match inner.records.get(session_id) {
                Some(record) => record.bytes.clone(),
                None => {
                    trace!(session_id = %session_id, "Session not in store");
                    return Ok(None);
                }
            }
        };

        let mut session = Session::from_bytes(&bytes, Arc::clone(&self.session_config))?;
        session.bind(self.handle());
        trace!(session_id = %session_id, "Session loaded");
        Ok(Some(session))
    }

    /// Save point for the batched policy.
    ///
    /// Saves only if the session is dirty, unless `always_save` is set.
    /// A clean session still refreshes its record's expiry.
    /// Returns whether a save happened.
    pub fn flush(&self, session: &mut Session) -> Result<bool> {
        if !session.is_dirty() && !self.config.always_save {
            trace!(session_id = ?session.id(), "Session clean, skipping save");
            self.touch_record(session)?;
            return Ok(false);
        }
        self.save(session, false)?;
        Ok(true)
    }

    /// Check if a record exists (without updating LRU order).
    pub fn contains(&self, session_id: &str) -> bool {
        self.inner.read().records.contains(session_id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Ids of all stored records.
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .records
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Drop records idle beyond their interval at `now` (epoch ms).
    pub fn cleanup_expired(&self, now: i64) -> usize {
        let mut inner = self.inner.write();
        let expired: Vec<String> = inner
            .records
            .iter()
            .filter(|(_, record)| record.is_expired_at(now))
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in &expired {
            debug!(session_id = %session_id, "Cleaning up expired session");
            inner.records.pop(session_id);
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "Cleaned up expired sessions");
        }

        expired.len()
    }

    /// Get store statistics.
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            size: inner.records.len(),
            capacity: self.config.max_sessions,
            saves: inner.saves,
            evictions: inner.evictions,
        }
    }

    /// Refresh a record's expiry fields from the session without re-encoding.
    ///
    /// A missing record (evicted or never added) is written in full.
    fn touch_record(&self, session: &Session) -> Result<()> {
        let Some(session_id) = session.id() else {
            return Ok(());
        };

        {
            let mut inner = self.inner.write();
            if let Some(record) = inner.records.get_mut(session_id) {
                record.accessed_at = session.base().this_accessed_time();
                record.max_inactive_interval = session.max_inactive_interval();
                return Ok(());
            }
        }

        debug!(session_id = %session_id, "Record missing at save point, rewriting");
        self.write_record(session)
    }

    fn write_record(&self, session: &Session) -> Result<()> {
        let session_id = session.id().ok_or(Error::MissingId)?.to_string();
        let record = StoredSession::from_session(session)?;

        let mut inner = self.inner.write();
        if let Some((evicted_id, _)) = inner.records.push(session_id.clone(), record)
            && evicted_id != session_id
        {
            debug!(session_id = %evicted_id, "Evicted LRU session to make room");
            inner.evictions += 1;
        }

        trace!(
            session_id = %session_id,
            store_size = inner.records.len(),
            "Session record written"
        );
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn add(&self, session: &Session) -> Result<()> {
        self.write_record(session)
    }

    fn remove(&self, session: &Session) -> Result<()> {
        if let Some(session_id) = session.id() {
            let mut inner = self.inner.write();
            if inner.records.pop(session_id).is_some() {
                debug!(session_id = %session_id, "Session removed from store");
            }
        }
        Ok(())
    }

    fn as_dirty_aware(&self) -> Option<&dyn DirtyAwareStore> {
        Some(self)
    }
}

impl DirtyAwareStore for MemoryStore {
    fn save_on_change(&self) -> bool {
        self.config.save_on_change
    }

    fn save(&self, session: &mut Session, synchronous: bool) -> Result<()> {
        self.write_record(session)?;
        self.inner.write().saves += 1;
        session.reset_dirty_tracking();

        debug!(session_id = ?session.id(), synchronous, "Session saved");
        Ok(())
    }
}

/// Store statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Current number of records.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Successful saves since creation.
    pub saves: u64,

    /// Records evicted to make room.
    pub evictions: u64,
}
