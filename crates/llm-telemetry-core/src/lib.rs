//! Telemetry core for LLM agent instrumentation.
//!
//! This crate turns raw execution events (agent invocations, tool calls,
//! model inference calls) into structured trace spans, propagates caller and
//! tenant context across asynchronous boundaries, and lets exactly one
//! process-wide enricher rewrite span content before export.
//!
//! # Data flow
//!
//! ```text
//! inbound activity
//!   └─ baggage::attach          populates the execution context
//!       └─ Scope::start         creates the span, copies initial attributes
//!           └─ BaggageSpanProcessor::on_start   injects baggage defaults
//!               └─ record_* calls on the Scope
//!                   └─ Scope disposed
//!                       └─ EnrichingSpanExporter   applies the enricher
//!                           └─ real exporter
//! ```
//!
//! Instrumentation must never break the host application: only pipeline
//! construction ([`init_telemetry`], [`Instrumentor::new`]) fails loudly;
//! everything downstream degrades to no-ops or logs and continues.

pub mod baggage;
pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod init;
pub mod processor;
pub mod scope;
pub mod semconv;

pub use baggage::{ExecutionType, InboundActivity, ParticipantRole};
pub use config::TelemetryConfig;
pub use content::{extract_input_content, extract_output_content, MessageContentEnricher};
pub use error::{Result, TelemetryError};
pub use export::{
    register_enricher, registered_enricher, unregister_enricher, EnrichedSpan,
    EnrichingSpanExporter, MergedSpan, SpanEnricher,
};
pub use init::{init_telemetry, is_initialized, Instrumentor};
pub use processor::BaggageSpanProcessor;
pub use scope::{
    GenAiOperation, InvocationRequest, InvocationResponse, Scope, ScopeDetails, ScopeKind,
    TenantDetails,
};
