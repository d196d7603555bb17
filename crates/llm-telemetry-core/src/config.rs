//! Telemetry configuration.
//!
//! Resolved once at startup, either explicitly or from `AGENT_TELEMETRY_*`
//! environment variables. When telemetry is disabled, scope creation still
//! succeeds and returns no-op scopes so call sites need no conditional logic.

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Enable telemetry entirely; disabled means every scope is a no-op
    pub enabled: bool,

    /// Drop raw input-message content from exported spans
    pub suppress_input_content: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            suppress_input_content: false,
        }
    }
}

impl TelemetryConfig {
    /// Create a new config builder
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::new()
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("AGENT_TELEMETRY_ENABLED")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            suppress_input_content: std::env::var("AGENT_TELEMETRY_SUPPRESS_INPUT_CONTENT")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
        }
    }
}

/// Builder for TelemetryConfig
pub struct TelemetryConfigBuilder {
    config: TelemetryConfig,
}

impl TelemetryConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: TelemetryConfig::default(),
        }
    }

    /// Enable or disable telemetry
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Enable or disable input-content suppression at export
    pub fn suppress_input_content(mut self, suppress: bool) -> Self {
        self.config.suppress_input_content = suppress;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TelemetryConfig {
        self.config
    }
}

impl Default for TelemetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
