//! Store collaborator traits.
//!
//! A [`crate::Session`] holds an `Arc<dyn SessionStore>` for the store that
//! owns it. Plain stores only see identity bookkeeping (`add`/`remove`).
//! Stores that replicate on every change additionally implement
//! [`DirtyAwareStore`], which is the only path through which a session
//! persists itself synchronously.

use crate::error::Result;
use crate::session::Session;

/// Store that owns a pool of sessions.
pub trait SessionStore: Send + Sync {
    /// Register the session under its current id.
    fn add(&self, session: &Session) -> Result<()>;

    /// Drop the record for the session's current id.
    fn remove(&self, session: &Session) -> Result<()>;

    /// Narrow this store to its save-on-change capability, if it has one.
    ///
    /// Default implementation returns `None`, so sessions bound to a plain
    /// store always buffer their changes.
    fn as_dirty_aware(&self) -> Option<&dyn DirtyAwareStore> {
        None
    }
}

/// Store that supports the save-on-change persistence policy.
pub trait DirtyAwareStore: SessionStore {
    /// Whether every detected change should be flushed immediately.
    fn save_on_change(&self) -> bool;

    /// Persist the session.
    ///
    /// Implementations reset the session's dirty tracking after a
    /// successful write. Errors are returned unchanged to the mutation
    /// that triggered the save.
    fn save(&self, session: &mut Session, synchronous: bool) -> Result<()>;
}

/// A store that accepts identity bookkeeping and persists nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopStore;

impl SessionStore for NoopStore {
    fn add(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _session: &Session) -> Result<()> {
        Ok(())
    }
}
