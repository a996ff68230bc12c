//! In-memory replicated session store.
//!
//! [`MemoryStore`] implements both store traits from `skein-session`:
//! - Identity bookkeeping (`add`/`remove`) for id reassignment
//! - Save-on-change or batched saves at explicit save points
//! - LRU bounding of the record map
//! - Idle-expiry cleanup
//!
//! # Example
//!
//! ```rust,ignore
//! use skein_store::{MemoryStore, StoreConfig};
//!
//! let store = MemoryStore::new(
//!     StoreConfig::default().with_save_on_change(true),
//!     Arc::new(SessionConfig::default()),
//! );
//! let mut session = store.create_session()?;
//! session.set_attribute("user", json!("alice"))?; // saved before returning
//! ```

mod config;
mod memory;

pub use config::{DEFAULT_MAX_SESSIONS, StoreConfig};
pub use memory::{MemoryStore, StoreStats, StoredSession};
