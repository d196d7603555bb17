//! Error types for the telemetry core.
//!
//! Only pipeline construction is allowed to fail loudly; everything on the
//! hot path (scope recording, baggage injection, enrichment) degrades
//! gracefully instead of surfacing errors to the traced application.

use thiserror::Error;

/// Main error type for telemetry setup and registration operations.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The telemetry pipeline was never initialized
    #[error("Telemetry not initialized: {0}")]
    NotInitialized(String),

    /// A span enricher is already installed in the process-wide slot
    #[error("A span enricher is already registered; unregister it first")]
    EnricherAlreadyRegistered,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TelemetryError {
    /// Create a not-initialized error
    pub fn not_initialized(msg: impl Into<String>) -> Self {
        TelemetryError::NotInitialized(msg.into())
    }

    /// Create an invalid-configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        TelemetryError::InvalidConfig(msg.into())
    }
}

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;
