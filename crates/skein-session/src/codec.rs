//! Session state serialization.
//!
//! The encoded form is two concatenated JSON documents: the base session
//! state, then the creation time as a trailing number. Reading applies the
//! trailing value over whatever the base document carried.

use std::sync::Arc;

use serde_json::{Deserializer, Value};

use crate::base::BaseSession;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::Session;

impl Session {
    /// Serialize the session state.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = serde_json::to_vec(self.base())?;
        out.push(b'\n');
        serde_json::to_writer(&mut out, &self.creation_time())?;
        Ok(out)
    }

    /// Rebuild a clean, unbound session from serialized state.
    pub fn from_bytes(bytes: &[u8], config: Arc<SessionConfig>) -> Result<Self> {
        let mut stream = Deserializer::from_slice(bytes).into_iter::<Value>();

        let base: BaseSession = match stream.next() {
            Some(value) => serde_json::from_value(value?)?,
            None => return Err(Error::Truncated),
        };
        let creation_time = match stream.next() {
            Some(value) => serde_json::from_value::<i64>(value?)?,
            None => return Err(Error::Truncated),
        };
        if stream.next().is_some() {
            return Err(Error::TrailingData);
        }

        let mut session = Session::from_base(base, config);
        // Assign the field directly: set_creation_time would also reset the
        // access times and restart the idle clock of every loaded session.
        session.base_mut().creation_time = creation_time;
        Ok(session)
    }
}
