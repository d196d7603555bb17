//! Error types for the telemetry caches.

use thiserror::Error;

/// Errors produced by the correlation and token caches.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A required string argument was empty or whitespace-only
    #[error("Invalid argument: `{field}` must not be blank")]
    BlankArgument {
        /// Name of the offending parameter
        field: &'static str,
    },

    /// No token generator was registered for the requested principal
    #[error("No token generator registered for agent `{agent_id}` in tenant `{tenant_id}`")]
    NotRegistered {
        agent_id: String,
        tenant_id: String,
    },

    /// The registered token generator failed to produce a token
    #[error("Token exchange failed for agent `{agent_id}`: {source}")]
    ExchangeFailed {
        agent_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CacheError {
    /// Create a blank-argument error for the named parameter.
    pub fn blank(field: &'static str) -> Self {
        CacheError::BlankArgument { field }
    }

    /// Check whether this is a validation error (vs a lookup miss or
    /// exchange failure).
    pub fn is_validation(&self) -> bool {
        matches!(self, CacheError::BlankArgument { .. })
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
