//! Scope: the create → record → close lifecycle around one traced operation.
//!
//! A [`Scope`] wraps one OpenTelemetry span and exposes a narrow, typed
//! surface for recording data discovered after the operation starts (tokens
//! used, messages produced, response ids, errors). Scope creation never
//! fails: when the tracer is unconfigured or telemetry is disabled, a no-op
//! scope is returned and every `record_*` call and `dispose()` is safe.
//!
//! A single `Scope` is owned by the code path that created it and is not
//! safe for concurrent mutation from multiple threads.

use opentelemetry::global::{self, BoxedSpan};
use opentelemetry::trace::{Span as _, SpanKind, Status, Tracer as _};
use opentelemetry::{Array, KeyValue, StringValue, Value};
use tracing::{debug, warn};
use url::Url;

use crate::semconv;

/// Instrumentation scope name the tracer is looked up under.
pub const TRACER_NAME: &str = "llm-agent-telemetry";

/// Operation being traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenAiOperation {
    /// An agent handling a request end to end.
    #[default]
    InvokeAgent,
    /// A single tool call made on the agent's behalf.
    ExecuteTool,
    /// One model inference call.
    Chat,
}

impl GenAiOperation {
    /// Attribute value for `gen_ai.operation.name`.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenAiOperation::InvokeAgent => "invoke_agent",
            GenAiOperation::ExecuteTool => "execute_tool",
            GenAiOperation::Chat => "chat",
        }
    }
}

/// Kind of the traced operation, mirroring the span kinds used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeKind {
    #[default]
    Client,
    Server,
    Internal,
}

impl ScopeKind {
    fn span_kind(self) -> SpanKind {
        match self {
            ScopeKind::Client => SpanKind::Client,
            ScopeKind::Server => SpanKind::Server,
            ScopeKind::Internal => SpanKind::Internal,
        }
    }
}

/// What is being invoked and where.
#[derive(Debug, Clone, Default)]
pub struct ScopeDetails {
    /// Operation classification for the span name and attributes.
    pub operation: GenAiOperation,
    /// Client/server/internal kind of the span.
    pub kind: ScopeKind,
    /// Identifier of the target agent.
    pub agent_id: Option<String>,
    /// Name of the target agent; used in the span name when present.
    pub agent_name: Option<String>,
    /// Target endpoint URL; contributes `server.address`/`server.port`.
    pub endpoint: Option<String>,
    /// Session the operation belongs to.
    pub session_id: Option<String>,
}

/// Tenant the operation runs under. The tenant id is omitted (never set to
/// an empty placeholder) when unknown.
#[derive(Debug, Clone, Default)]
pub struct TenantDetails {
    pub tenant_id: Option<String>,
}

/// Request content supplied when the operation starts.
#[derive(Debug, Clone, Default)]
pub struct InvocationRequest {
    /// Structured input messages, recorded as a JSON-encoded list.
    pub messages: Vec<serde_json::Value>,
}

/// Response data discovered when the operation completes.
#[derive(Debug, Clone, Default)]
pub struct InvocationResponse {
    /// Structured output messages produced by the operation.
    pub messages: Vec<serde_json::Value>,
    /// Provider-assigned response identifier.
    pub response_id: Option<String>,
    /// Finish reasons reported for the response choices.
    pub finish_reasons: Vec<String>,
    /// Tokens consumed by the call.
    pub input_tokens: Option<u64>,
    /// Tokens produced by the call.
    pub output_tokens: Option<u64>,
}

/// One traced operation.
///
/// State machine: `created → started → (recording)* → disposed`. `dispose()`
/// ends the span exactly once; no attribute write after disposal is
/// observable in the exported span.
///
/// `record_*` writes are buffered per key and flushed when the scope is
/// disposed. The underlying SDK span appends on every `set_attribute` call,
/// so writing eagerly would leave one stale copy per call on the exported
/// span; buffering keeps the exported attribute set a proper key → value
/// mapping with the last recorded value winning.
#[derive(Debug)]
pub struct Scope {
    span: Option<BoxedSpan>,
    disposed: bool,
    input_messages: Vec<serde_json::Value>,
    output_messages: Vec<serde_json::Value>,
    pending: Vec<KeyValue>,
}

impl Scope {
    /// Start a new scope for the described operation.
    ///
    /// The span is named from the operation and, when available, the target
    /// agent name. Initial attributes cover the operation, tenant, endpoint
    /// and session; the request content is recorded when supplied. If no
    /// tracer provider is configured the returned scope wraps a
    /// non-recording span and behaves as a no-op.
    pub fn start(
        details: &ScopeDetails,
        tenant: &TenantDetails,
        request: Option<&InvocationRequest>,
    ) -> Scope {
        let tracer = global::tracer(TRACER_NAME);

        let name = match &details.agent_name {
            Some(agent_name) => format!("{} {}", details.operation.as_str(), agent_name),
            None => details.operation.as_str().to_string(),
        };

        let mut attributes = vec![KeyValue::new(
            semconv::OPERATION_NAME,
            details.operation.as_str(),
        )];
        if let Some(agent_id) = &details.agent_id {
            attributes.push(KeyValue::new(semconv::AGENT_ID, agent_id.clone()));
        }
        if let Some(agent_name) = &details.agent_name {
            attributes.push(KeyValue::new(semconv::AGENT_NAME, agent_name.clone()));
        }
        if let Some(tenant_id) = &tenant.tenant_id {
            attributes.push(KeyValue::new(semconv::TENANT_ID, tenant_id.clone()));
        }
        if let Some(session_id) = &details.session_id {
            attributes.push(KeyValue::new(semconv::SESSION_ID, session_id.clone()));
        }
        if let Some(endpoint) = &details.endpoint {
            match Url::parse(endpoint) {
                Ok(url) => {
                    if let Some(host) = url.host_str() {
                        attributes
                            .push(KeyValue::new(semconv::SERVER_ADDRESS, host.to_string()));
                    }
                    // Url::port() is None when the port is the scheme default.
                    if let Some(port) = url.port() {
                        attributes.push(KeyValue::new(semconv::SERVER_PORT, port as i64));
                    }
                }
                Err(err) => {
                    debug!(endpoint = %endpoint, error = %err, "Skipping endpoint attributes for unparseable URL");
                }
            }
        }

        let span = tracer
            .span_builder(name)
            .with_kind(details.kind.span_kind())
            .with_attributes(attributes)
            .start(&tracer);

        let mut scope = Scope {
            span: Some(span),
            disposed: false,
            input_messages: Vec::new(),
            output_messages: Vec::new(),
            pending: Vec::new(),
        };
        if let Some(request) = request {
            scope.record_input_messages(&request.messages);
        }
        scope
    }

    /// Create a no-op scope. Every `record_*` call and `dispose()` on it is
    /// a safe no-op, so call sites need no conditional logic when telemetry
    /// is disabled.
    pub fn disabled() -> Scope {
        Scope {
            span: None,
            disposed: false,
            input_messages: Vec::new(),
            output_messages: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Check whether this scope records anything at all.
    pub fn is_noop(&self) -> bool {
        self.span.is_none()
    }

    /// Check whether the scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Append input messages, preserving everything recorded so far.
    pub fn record_input_messages(&mut self, messages: &[serde_json::Value]) {
        if messages.is_empty() {
            return;
        }
        self.input_messages.extend_from_slice(messages);
        let json = Self::to_json(&self.input_messages);
        self.set_attribute(KeyValue::new(semconv::INPUT_MESSAGES, json));
    }

    /// Append output messages, preserving everything recorded so far.
    pub fn record_output_messages(&mut self, messages: &[serde_json::Value]) {
        if messages.is_empty() {
            return;
        }
        self.output_messages.extend_from_slice(messages);
        let json = Self::to_json(&self.output_messages);
        self.set_attribute(KeyValue::new(semconv::OUTPUT_MESSAGES, json));
    }

    /// Record everything a completed response carries in one call.
    pub fn record_response(&mut self, response: &InvocationResponse) {
        self.record_output_messages(&response.messages);
        if let Some(response_id) = &response.response_id {
            self.record_response_id(response_id);
        }
        if !response.finish_reasons.is_empty() {
            self.record_finish_reasons(&response.finish_reasons);
        }
        if let Some(input_tokens) = response.input_tokens {
            self.record_input_tokens(input_tokens);
        }
        if let Some(output_tokens) = response.output_tokens {
            self.record_output_tokens(output_tokens);
        }
    }

    /// Record tokens consumed by the call.
    pub fn record_input_tokens(&mut self, tokens: u64) {
        self.set_attribute(KeyValue::new(semconv::USAGE_INPUT_TOKENS, tokens as i64));
    }

    /// Record tokens produced by the call.
    pub fn record_output_tokens(&mut self, tokens: u64) {
        self.set_attribute(KeyValue::new(semconv::USAGE_OUTPUT_TOKENS, tokens as i64));
    }

    /// Record the finish reasons reported for the response choices.
    pub fn record_finish_reasons(&mut self, reasons: &[String]) {
        let values: Vec<StringValue> = reasons.iter().cloned().map(StringValue::from).collect();
        self.set_attribute(KeyValue::new(
            semconv::RESPONSE_FINISH_REASONS,
            Value::Array(Array::String(values)),
        ));
    }

    /// Record the provider-assigned response id, replacing any previous one.
    pub fn record_response_id(&mut self, response_id: &str) {
        self.set_attribute(KeyValue::new(
            semconv::RESPONSE_ID,
            response_id.to_string(),
        ));
    }

    /// Record an error status on the span.
    pub fn record_error(&mut self, err: &dyn std::error::Error) {
        if self.disposed {
            return;
        }
        if let Some(span) = &mut self.span {
            span.record_error(err);
            span.set_status(Status::error(err.to_string()));
        }
    }

    /// Set a single string attribute under one of the `semconv` keys.
    pub fn record_attribute(&mut self, key: &'static str, value: impl Into<String>) {
        self.set_attribute(KeyValue::new(key, value.into()));
    }

    /// Flush the buffered attributes and end the underlying span. The first
    /// call ends the span; later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(span) = &mut self.span {
            for attribute in self.pending.drain(..) {
                span.set_attribute(attribute);
            }
            span.end();
        }
    }

    /// Run `f` with this scope as a managed resource.
    ///
    /// Whether `f` succeeds or fails, the scope is disposed exactly once;
    /// an error propagating out of `f` is recorded on the span first.
    pub fn run<T, E>(mut self, f: impl FnOnce(&mut Scope) -> Result<T, E>) -> Result<T, E>
    where
        E: std::error::Error,
    {
        let result = f(&mut self);
        if let Err(err) = &result {
            self.record_error(err);
        }
        self.dispose();
        result
    }

    // Buffers last-wins per key; dispose() writes each key once.
    fn set_attribute(&mut self, attribute: KeyValue) {
        if self.disposed || self.span.is_none() {
            return;
        }
        match self.pending.iter_mut().find(|kv| kv.key == attribute.key) {
            Some(existing) => *existing = attribute,
            None => self.pending.push(attribute),
        }
    }

    fn to_json(messages: &[serde_json::Value]) -> String {
        serde_json::to_string(messages).unwrap_or_else(|err| {
            warn!(error = %err, "Failed to serialize recorded messages");
            "[]".to_string()
        })
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}
