//! Replicated session entity with dirty tracking.
//!
//! This crate decides, on every session mutation, whether the change must be
//! shipped to a shared backing store and when:
//! - Attribute writes are value-compared; unchanged writes are free
//! - Changes are buffered for the next save point, or saved immediately when
//!   the bound store runs a save-on-change policy
//! - Id reassignment can be mirrored into the store's index
//! - Session state round-trips through a serialized form
//!
//! # Example
//!
//! ```rust,ignore
//! use skein_session::{AttributeStore, Session, SessionConfig};
//!
//! let config = Arc::new(SessionConfig::default().with_manual_dirty_tracking(true));
//! let mut session = Session::with_store(config, store);
//! session.set_attribute("cart", json!([1, 2]))?;
//! assert!(session.is_dirty());
//! ```

mod attribute;
mod base;
mod codec;
mod config;
mod error;
mod persistence;
mod session;

pub use attribute::is_change;
pub use base::{AttributeStore, BaseSession, Invalidatable, Principal, now_millis};
pub use config::{
    DEFAULT_MANUAL_DIRTY_TRACKING_KEY, DEFAULT_MAX_INACTIVE_INTERVAL_SECS, SessionConfig,
};
pub use error::{Error, Result};
pub use persistence::{DirtyAwareStore, NoopStore, SessionStore};
pub use session::Session;
