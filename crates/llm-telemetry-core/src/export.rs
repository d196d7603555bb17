//! Enriching export pipeline.
//!
//! Exactly one process-wide enricher may rewrite a finished span's
//! attributes before it reaches the real exporter. The enricher is treated
//! as untrusted: a returned error or a panic is logged and the span is
//! exported unenriched. Registration and unregistration are atomic with
//! respect to concurrent readers on the export path.

use std::collections::HashSet;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use opentelemetry::{Key, KeyValue};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{SpanData, SpanExporter};
use opentelemetry_sdk::Resource;
use tracing::warn;

use crate::error::{Result, TelemetryError};
use crate::semconv;

/// A single process-wide function rewriting finished spans before export.
///
/// Implementations must treat the input span as read-only and return either
/// [`EnrichedSpan::Unchanged`] or a merged view; they must never mutate
/// shared state the export thread cannot see.
pub trait SpanEnricher: Send + Sync {
    /// Inspect a finished span and decide how it should be exported.
    fn enrich<'a>(&self, span: &'a SpanData) -> anyhow::Result<EnrichedSpan<'a>>;
}

/// Outcome of one enrichment call.
pub enum EnrichedSpan<'a> {
    /// Export the original span as-is.
    Unchanged,
    /// Export a merged view of the original span.
    Merged(MergedSpan<'a>),
}

/// Read-only decorator over a finished span.
///
/// Attributes are the original ones overlaid by the replacements (the
/// replacement value wins on key collision); name, context, timing, status,
/// events and links delegate unchanged to the original. No attribute
/// identity leaks back into the original span.
pub struct MergedSpan<'a> {
    original: &'a SpanData,
    replacements: Vec<KeyValue>,
}

impl<'a> MergedSpan<'a> {
    /// Overlay `replacements` onto `original`.
    pub fn new(original: &'a SpanData, replacements: Vec<KeyValue>) -> Self {
        Self {
            original,
            replacements,
        }
    }

    /// Span name, unchanged from the original.
    pub fn name(&self) -> &str {
        &self.original.name
    }

    /// The merged attribute set.
    pub fn attributes(&self) -> Vec<KeyValue> {
        let replaced: HashSet<&Key> = self.replacements.iter().map(|kv| &kv.key).collect();
        let mut merged: Vec<KeyValue> = self
            .original
            .attributes
            .iter()
            .filter(|kv| !replaced.contains(&kv.key))
            .cloned()
            .collect();
        merged.extend(self.replacements.iter().cloned());
        merged
    }

    /// Materialize the merged view as an owned span for the exporter.
    pub fn into_span_data(self) -> SpanData {
        let mut span = self.original.clone();
        span.attributes = self.attributes();
        span
    }
}

/// Process-wide single-holder slot for the span enricher.
///
/// `get()` clones the `Arc` under a read lock, so readers always observe a
/// stable snapshot even while another thread unregisters.
pub struct EnricherRegistry {
    slot: RwLock<Option<Arc<dyn SpanEnricher>>>,
}

impl EnricherRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Install an enricher. Fails when one is already registered.
    pub fn register(&self, enricher: Arc<dyn SpanEnricher>) -> Result<()> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return Err(TelemetryError::EnricherAlreadyRegistered);
        }
        *slot = Some(enricher);
        Ok(())
    }

    /// Clear the slot. A no-op when nothing is registered.
    pub fn unregister(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Snapshot of the currently registered enricher, if any.
    pub fn get(&self) -> Option<Arc<dyn SpanEnricher>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }
}

impl Default for EnricherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_ENRICHER: EnricherRegistry = EnricherRegistry::new();

/// Install the process-wide span enricher.
pub fn register_enricher(enricher: Arc<dyn SpanEnricher>) -> Result<()> {
    GLOBAL_ENRICHER.register(enricher)
}

/// Remove the process-wide span enricher, if any.
pub fn unregister_enricher() {
    GLOBAL_ENRICHER.unregister()
}

/// Snapshot of the process-wide span enricher.
pub fn registered_enricher() -> Option<Arc<dyn SpanEnricher>> {
    GLOBAL_ENRICHER.get()
}

/// Exporter decorator applying the registered enricher to every finished
/// span before forwarding the batch to the real exporter.
#[derive(Debug)]
pub struct EnrichingSpanExporter<E> {
    inner: E,
    suppress_input_content: bool,
}

impl<E: SpanExporter> EnrichingSpanExporter<E> {
    /// Wrap the real exporter.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            suppress_input_content: false,
        }
    }

    /// Additionally drop raw input-message content from exported spans.
    /// Resolved at configuration time; default is to not suppress.
    pub fn with_content_suppression(mut self, suppress: bool) -> Self {
        self.suppress_input_content = suppress;
        self
    }

    fn apply(
        mut span: SpanData,
        enricher: Option<&Arc<dyn SpanEnricher>>,
        suppress_input_content: bool,
    ) -> SpanData {
        if let Some(enricher) = enricher {
            let rewritten = {
                let outcome = catch_unwind(AssertUnwindSafe(|| enricher.enrich(&span)));
                match outcome {
                    Ok(Ok(EnrichedSpan::Unchanged)) => None,
                    Ok(Ok(EnrichedSpan::Merged(merged))) => Some(merged.into_span_data()),
                    Ok(Err(err)) => {
                        warn!(error = %err, "Span enricher failed; exporting original span");
                        None
                    }
                    Err(_) => {
                        warn!("Span enricher panicked; exporting original span");
                        None
                    }
                }
            };
            if let Some(rewritten) = rewritten {
                span = rewritten;
            }
        }

        if suppress_input_content {
            span.attributes
                .retain(|kv| kv.key.as_str() != semconv::INPUT_MESSAGES);
        }
        span
    }
}

impl<E: SpanExporter> SpanExporter for EnrichingSpanExporter<E> {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        let enricher = registered_enricher();
        let batch: Vec<SpanData> = batch
            .into_iter()
            .map(|span| Self::apply(span, enricher.as_ref(), self.suppress_input_content))
            .collect();
        self.inner.export(batch)
    }

    fn shutdown_with_timeout(&mut self, timeout: Duration) -> OTelSdkResult {
        self.inner.shutdown_with_timeout(timeout)
    }

    fn shutdown(&mut self) -> OTelSdkResult {
        self.inner.shutdown()
    }

    fn force_flush(&mut self) -> OTelSdkResult {
        self.inner.force_flush()
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.inner.set_resource(resource);
    }
}
