//! Configuration for the in-memory session store.

use serde::{Deserialize, Serialize};

/// Default maximum number of session records kept before LRU eviction.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Configuration for [`crate::MemoryStore`].
///
/// ```toml
/// save_on_change = true
/// always_save = false
/// max_sessions = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persist every detected change immediately instead of at save points.
    pub save_on_change: bool,

    /// Persist at every save point even when the session is clean.
    pub always_save: bool,

    /// Maximum number of records before the least recently used is evicted.
    pub max_sessions: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_on_change: false,
            always_save: false,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> skein_session::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Enable or disable save-on-change.
    pub fn with_save_on_change(mut self, enabled: bool) -> Self {
        self.save_on_change = enabled;
        self
    }

    /// Enable or disable saving clean sessions at save points.
    pub fn with_always_save(mut self, enabled: bool) -> Self {
        self.always_save = enabled;
        self
    }

    /// Set the maximum number of records.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let config = StoreConfig::from_toml("save_on_change = true\nmax_sessions = 5").unwrap();
        assert!(config.save_on_change);
        assert!(!config.always_save);
        assert_eq!(config.max_sessions, 5);
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .with_save_on_change(true)
            .with_always_save(true)
            .with_max_sessions(3);
        assert!(config.save_on_change);
        assert!(config.always_save);
        assert_eq!(config.max_sessions, 3);
    }
}
