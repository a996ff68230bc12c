//! Error types for session operations.

/// Error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error reported by the backing store.
    #[error("Store error: {0}")]
    Store(String),

    /// The session was used after it had been invalidated.
    #[error("Session invalidated: {0}")]
    Invalidated(String),

    /// The session has no id, so it cannot be keyed in a store.
    #[error("Session has no id")]
    MissingId,

    /// Malformed session state.
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Serialized state ended before the trailing creation time.
    #[error("Serialized session is truncated: missing creation time")]
    Truncated,

    /// Serialized state carried data after the trailing creation time.
    #[error("Serialized session has trailing data after creation time")]
    TrailingData,

    /// Failed to parse configuration.
    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
