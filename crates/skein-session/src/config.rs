//! Process-wide session tracking configuration.
//!
//! Built once at startup and shared by every session through an `Arc`:
//!
//! ```toml
//! manual_dirty_tracking = true
//! manual_dirty_tracking_key = "__changed__"
//! monitor_destroyed_sessions = false
//! max_inactive_interval_secs = 1800
//! ```

use serde::{Deserialize, Serialize};

/// Default attribute name that signals "mark this session dirty".
pub const DEFAULT_MANUAL_DIRTY_TRACKING_KEY: &str = "__changed__";

/// Default idle interval before a session expires (30 minutes).
pub const DEFAULT_MAX_INACTIVE_INTERVAL_SECS: i64 = 1800;

/// Configuration for session dirty tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interpret writes of `manual_dirty_tracking_key` as a dirty signal.
    pub manual_dirty_tracking: bool,

    /// Sentinel attribute name used when manual tracking is enabled.
    pub manual_dirty_tracking_key: String,

    /// Treat id reassignment as destroy-old/create-new against the store.
    pub monitor_destroyed_sessions: bool,

    /// Idle interval for newly created sessions. Zero or negative never expires.
    pub max_inactive_interval_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            manual_dirty_tracking: false,
            manual_dirty_tracking_key: DEFAULT_MANUAL_DIRTY_TRACKING_KEY.to_string(),
            monitor_destroyed_sessions: false,
            max_inactive_interval_secs: DEFAULT_MAX_INACTIVE_INTERVAL_SECS,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Enable or disable manual dirty tracking.
    pub fn with_manual_dirty_tracking(mut self, enabled: bool) -> Self {
        self.manual_dirty_tracking = enabled;
        self
    }

    /// Set the sentinel attribute name for manual dirty tracking.
    pub fn with_manual_dirty_tracking_key(mut self, key: impl Into<String>) -> Self {
        self.manual_dirty_tracking_key = key.into();
        self
    }

    /// Enable or disable destruction monitoring on id reassignment.
    pub fn with_monitor_destroyed_sessions(mut self, enabled: bool) -> Self {
        self.monitor_destroyed_sessions = enabled;
        self
    }

    /// Set the idle interval for new sessions.
    pub fn with_max_inactive_interval_secs(mut self, secs: i64) -> Self {
        self.max_inactive_interval_secs = secs;
        self
    }

    /// Whether `key` is the manual dirty-tracking sentinel under this config.
    pub fn is_manual_dirty_signal(&self, key: &str) -> bool {
        self.manual_dirty_tracking && self.manual_dirty_tracking_key == key
    }
}
