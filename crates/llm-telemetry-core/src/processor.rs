//! Span processor stamping baggage-derived attributes at span start.
//!
//! Wraps the downstream processor so baggage attributes are guaranteed to be
//! present before enrichment and export run on the span.

use std::time::Duration;

use opentelemetry::baggage::BaggageExt;
use opentelemetry::trace::Span as _;
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{Span, SpanData, SpanProcessor};
use opentelemetry_sdk::Resource;

use crate::semconv;

/// Copies the propagated baggage fields onto every new span and stamps the
/// operation source, defaulting to [`semconv::DEFAULT_OPERATION_SOURCE`]
/// when baggage carries none.
#[derive(Debug)]
pub struct BaggageSpanProcessor<P> {
    inner: P,
}

impl<P: SpanProcessor> BaggageSpanProcessor<P> {
    /// Wrap the downstream processor.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: SpanProcessor> SpanProcessor for BaggageSpanProcessor<P> {
    fn on_start(&self, span: &mut Span, cx: &Context) {
        let baggage = cx.baggage();

        for key in semconv::PROPAGATED_KEYS {
            if let Some(value) = baggage.get(*key) {
                span.set_attribute(KeyValue::new(*key, value.as_str().to_string()));
            }
        }

        let source = baggage
            .get(semconv::OPERATION_SOURCE)
            .map(|value| value.as_str().to_string())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| semconv::DEFAULT_OPERATION_SOURCE.to_string());
        span.set_attribute(KeyValue::new(semconv::OPERATION_SOURCE, source));

        self.inner.on_start(span, cx);
    }

    fn on_end(&self, span: SpanData) {
        self.inner.on_end(span);
    }

    fn force_flush(&self) -> OTelSdkResult {
        self.inner.force_flush()
    }

    fn shutdown(&self) -> OTelSdkResult {
        self.inner.shutdown()
    }

    fn shutdown_with_timeout(&self, timeout: Duration) -> OTelSdkResult {
        self.inner.shutdown_with_timeout(timeout)
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.inner.set_resource(resource);
    }
}
