//! Pipeline assembly and the instrumentor entry point.
//!
//! `init_telemetry` wires the baggage processor and enriching exporter into
//! a tracer provider and installs it globally. Constructing an
//! [`Instrumentor`] is the one place allowed to fail loudly: everything it
//! hands out afterwards degrades gracefully instead of surfacing errors to
//! the traced application.

use std::sync::atomic::{AtomicBool, Ordering};

use opentelemetry::global;
use opentelemetry_sdk::trace::{SdkTracerProvider, SimpleSpanProcessor, SpanExporter};
use tracing::info;

use crate::config::TelemetryConfig;
use crate::error::{Result, TelemetryError};
use crate::export::EnrichingSpanExporter;
use crate::processor::BaggageSpanProcessor;
use crate::scope::{InvocationRequest, Scope, ScopeDetails, TenantDetails};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Check whether `init_telemetry` has run in this process.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}

/// Assemble the telemetry pipeline around `exporter` and install it as the
/// global tracer provider.
///
/// The baggage processor runs at span start, so baggage-derived attributes
/// are already present when the enriching exporter sees the finished span.
/// Returns the provider so the host can flush and shut it down.
pub fn init_telemetry<E>(config: &TelemetryConfig, exporter: E) -> Result<SdkTracerProvider>
where
    E: SpanExporter + 'static,
{
    if !config.enabled {
        return Err(TelemetryError::invalid_config(
            "telemetry is disabled; refusing to install an export pipeline",
        ));
    }

    let exporter =
        EnrichingSpanExporter::new(exporter).with_content_suppression(config.suppress_input_content);
    let processor = BaggageSpanProcessor::new(SimpleSpanProcessor::new(exporter));
    let provider = SdkTracerProvider::builder()
        .with_span_processor(processor)
        .build();

    global::set_tracer_provider(provider.clone());
    INITIALIZED.store(true, Ordering::SeqCst);
    info!(
        suppress_input_content = config.suppress_input_content,
        "Telemetry pipeline initialized"
    );

    Ok(provider)
}

/// Factory for scopes, gated on configuration.
///
/// Construction fails when telemetry is enabled but the pipeline was never
/// initialized; a disabled configuration yields an instrumentor whose every
/// scope is a no-op.
#[derive(Debug, Clone)]
pub struct Instrumentor {
    config: TelemetryConfig,
}

impl Instrumentor {
    /// Create an instrumentor for the given configuration.
    pub fn new(config: TelemetryConfig) -> Result<Self> {
        if config.enabled && !is_initialized() {
            return Err(TelemetryError::not_initialized(
                "call init_telemetry before constructing an Instrumentor",
            ));
        }
        Ok(Self { config })
    }

    /// Create an instrumentor from `AGENT_TELEMETRY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(TelemetryConfig::from_env())
    }

    /// The configuration this instrumentor was built with.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Start a scope for the described operation, or a no-op scope when
    /// telemetry is disabled.
    pub fn start_scope(
        &self,
        details: &ScopeDetails,
        tenant: &TenantDetails,
        request: Option<&InvocationRequest>,
    ) -> Scope {
        if !self.config.enabled {
            return Scope::disabled();
        }
        Scope::start(details, tenant, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_instrumentor_needs_no_pipeline() {
        let config = TelemetryConfig::builder().enabled(false).build();
        let instrumentor = Instrumentor::new(config).unwrap();

        let scope = instrumentor.start_scope(
            &ScopeDetails::default(),
            &TenantDetails::default(),
            None,
        );
        assert!(scope.is_noop());
    }

    #[test]
    fn test_enabled_instrumentor_requires_pipeline() {
        // No unit test in this binary installs the pipeline, so the flag is
        // still unset here.
        let err = Instrumentor::new(TelemetryConfig::default()).unwrap_err();
        assert!(matches!(err, TelemetryError::NotInitialized(_)));
    }

    #[test]
    fn test_init_refuses_disabled_config() {
        let config = TelemetryConfig::builder().enabled(false).build();
        let exporter = opentelemetry_sdk::trace::InMemorySpanExporter::default();
        let err = init_telemetry(&config, exporter).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidConfig(_)));
    }
}
