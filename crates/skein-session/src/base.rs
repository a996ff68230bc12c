//! Base session contract: plain attribute storage, expiry fields and
//! invalidation, with no dirty tracking.
//!
//! [`BaseSession`] is what the container hands out when no replication is
//! involved. [`crate::Session`] wraps it and routes every operation through
//! the dirty-tracking decision logic.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Authenticated user bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User name.
    pub name: String,

    /// Roles granted to the user.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Principal {
    /// Create a principal with no roles.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Add a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

/// Get/set/enumerate surface for named session attributes.
pub trait AttributeStore {
    /// Look up an attribute.
    fn get_attribute(&self, name: &str) -> Result<Option<&Value>>;

    /// Names of all attributes, in no particular order.
    fn attribute_names(&self) -> Result<Vec<String>>;

    /// Write an attribute. A `None` value removes it.
    fn set_attribute(&mut self, name: &str, value: impl Into<Option<Value>>) -> Result<()>;

    /// Remove an attribute. Removing an absent name is not an error.
    fn remove_attribute(&mut self, name: &str) -> Result<()>;
}

/// Session invalidation surface.
pub trait Invalidatable {
    /// Invalidate the session, discarding its attributes.
    fn invalidate(&mut self) -> Result<()>;

    /// Whether the session has not been invalidated.
    fn is_valid(&self) -> bool;
}

/// Session state without replication semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSession {
    pub(crate) id: Option<String>,
    pub(crate) creation_time: i64,
    pub(crate) last_accessed_time: i64,
    pub(crate) this_accessed_time: i64,
    pub(crate) max_inactive_interval: i64,
    pub(crate) is_new: bool,
    pub(crate) is_valid: bool,
    #[serde(default)]
    pub(crate) principal: Option<Principal>,
    #[serde(default)]
    pub(crate) attributes: HashMap<String, Value>,
}

impl BaseSession {
    /// Create a fresh, valid session with no id.
    pub fn new(max_inactive_interval: i64) -> Self {
        let now = now_millis();
        Self {
            id: None,
            creation_time: now,
            last_accessed_time: now,
            this_accessed_time: now,
            max_inactive_interval,
            is_new: true,
            is_valid: true,
            principal: None,
            attributes: HashMap::new(),
        }
    }

    /// Current id, or `None` before one is assigned.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Assign the id with no side effects.
    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    /// Creation time in epoch milliseconds.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// Set the creation time, resetting both access times to it.
    pub fn set_creation_time(&mut self, time: i64) {
        self.creation_time = time;
        self.last_accessed_time = time;
        self.this_accessed_time = time;
    }

    /// Access time before the current request (epoch ms).
    pub fn last_accessed_time(&self) -> i64 {
        self.last_accessed_time
    }

    /// Time of the most recent access in epoch milliseconds.
    pub fn this_accessed_time(&self) -> i64 {
        self.this_accessed_time
    }

    /// Idle interval in seconds. Zero or negative never expires.
    pub fn max_inactive_interval(&self) -> i64 {
        self.max_inactive_interval
    }

    /// Set the idle interval in seconds.
    pub fn set_max_inactive_interval(&mut self, secs: i64) {
        self.max_inactive_interval = secs;
    }

    /// Whether the client has not yet joined the session.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Authenticated principal, if bound.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Bind or clear the principal.
    pub fn set_principal(&mut self, principal: Option<Principal>) {
        self.principal = principal;
    }

    /// Record a request touching the session at `now` (epoch ms).
    pub fn access(&mut self, now: i64) {
        self.last_accessed_time = self.this_accessed_time;
        self.this_accessed_time = now;
        self.is_new = false;
    }

    /// Whether the session has been idle longer than its interval at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        if self.max_inactive_interval <= 0 {
            return false;
        }
        let idle_ms = now.saturating_sub(self.this_accessed_time);
        idle_ms > self.max_inactive_interval.saturating_mul(1000)
    }

    /// Write or clear an attribute, returning the previous value.
    pub(crate) fn replace_attribute(
        &mut self,
        name: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>> {
        self.ensure_valid()?;
        Ok(match value {
            Some(value) => self.attributes.insert(name.to_string(), value),
            None => self.attributes.remove(name),
        })
    }

    pub(crate) fn ensure_valid(&self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(Error::Invalidated(self.id.clone().unwrap_or_default()))
        }
    }
}

impl AttributeStore for BaseSession {
    fn get_attribute(&self, name: &str) -> Result<Option<&Value>> {
        self.ensure_valid()?;
        Ok(self.attributes.get(name))
    }

    fn attribute_names(&self) -> Result<Vec<String>> {
        self.ensure_valid()?;
        Ok(self.attributes.keys().cloned().collect())
    }

    fn set_attribute(&mut self, name: &str, value: impl Into<Option<Value>>) -> Result<()> {
        self.replace_attribute(name, value.into()).map(|_| ())
    }

    fn remove_attribute(&mut self, name: &str) -> Result<()> {
        self.ensure_valid()?;
        self.attributes.remove(name);
        Ok(())
    }
}

impl Invalidatable for BaseSession {
    fn invalidate(&mut self) -> Result<()> {
        self.ensure_valid()?;
        self.is_valid = false;
        self.attributes.clear();
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.is_valid
    }
}
