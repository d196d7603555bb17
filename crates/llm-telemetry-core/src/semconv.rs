//! Semantic-convention keys for agent telemetry.
//!
//! These string constants name both span attributes and baggage entries.
//! Cross-language trace correlation depends on key-name parity, so every
//! extractor and injector in this crate must use these exact keys.

/// Operation being performed, e.g. `invoke_agent`.
pub const OPERATION_NAME: &str = "gen_ai.operation.name";

/// Where the operation originated (baggage-driven, defaults to `SDK`).
pub const OPERATION_SOURCE: &str = "gen_ai.operation.source";

/// Default stamped when no operation source is present in baggage.
pub const DEFAULT_OPERATION_SOURCE: &str = "SDK";

/// Identifier of the agent being invoked.
pub const AGENT_ID: &str = "gen_ai.agent.id";

/// Human-readable name of the agent being invoked.
pub const AGENT_NAME: &str = "gen_ai.agent.name";

/// Identifier of the caller that triggered the operation.
pub const CALLER_ID: &str = "gen_ai.caller.id";

/// Tenant owning the agent. Absent (never empty) when unknown.
pub const TENANT_ID: &str = "gen_ai.tenant.id";

/// Conversation the operation belongs to.
pub const CONVERSATION_ID: &str = "gen_ai.conversation.id";

/// Channel the inbound activity arrived on.
pub const CHANNEL_ID: &str = "gen_ai.channel.id";

/// Event source for event-driven invocations.
pub const EVENT_SOURCE: &str = "gen_ai.event.source";

/// Classification of who is talking to whom (see `ExecutionType`).
pub const EXECUTION_TYPE: &str = "gen_ai.execution.type";

/// Session identifier of the traced operation.
pub const SESSION_ID: &str = "gen_ai.session.id";

/// JSON-encoded list of input messages.
pub const INPUT_MESSAGES: &str = "gen_ai.input.messages";

/// JSON-encoded list of output messages.
pub const OUTPUT_MESSAGES: &str = "gen_ai.output.messages";

/// Tokens consumed by the model call.
pub const USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// Tokens produced by the model call.
pub const USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Provider-assigned response identifier.
pub const RESPONSE_ID: &str = "gen_ai.response.id";

/// Finish reasons reported for the response choices.
pub const RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

/// Target endpoint host.
pub const SERVER_ADDRESS: &str = "server.address";

/// Target endpoint port, emitted only when non-default for the scheme.
pub const SERVER_PORT: &str = "server.port";

/// Baggage keys copied onto every span at start time.
pub const PROPAGATED_KEYS: &[&str] = &[
    CALLER_ID,
    AGENT_ID,
    TENANT_ID,
    CONVERSATION_ID,
    CHANNEL_ID,
    EVENT_SOURCE,
    EXECUTION_TYPE,
];
