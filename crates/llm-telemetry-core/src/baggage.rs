//! Baggage propagation for inbound agent activities.
//!
//! Derives an ordered sequence of (key, value) pairs from an inbound
//! activity and installs them as baggage on the current execution context,
//! and/or stamps them directly onto a target scope. Every extractor is a
//! pure function; missing fields are skipped rather than emitted as
//! placeholder values, except the execution type which always emits.
//!
//! Baggage set here is visible to any scope created while the context is
//! active and is restored to the prior context when the guard drops,
//! regardless of errors (copy-on-branch: children see, but never mutate,
//! the parent's entries).

use opentelemetry::baggage::BaggageExt;
use opentelemetry::{Context, ContextGuard, KeyValue};

use crate::scope::Scope;
use crate::semconv;

/// Role a conversation participant plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    /// A human end user.
    User,
    /// An agent acting as a user of another agent.
    AgenticUser,
    /// A bot or service principal.
    Bot,
}

/// Classification of who triggered the traced operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionType {
    /// A user (human) invoking an agent.
    UserToAgent,
    /// One agent invoking another agent.
    AgentToAgent,
    /// An event source (webhook, schedule) invoking an agent.
    EventToAgent,
}

impl ExecutionType {
    /// Attribute value for `gen_ai.execution.type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionType::UserToAgent => "user_to_agent",
            ExecutionType::AgentToAgent => "agent_to_agent",
            ExecutionType::EventToAgent => "event_to_agent",
        }
    }
}

/// The cross-boundary fields of an inbound request or activity.
#[derive(Debug, Clone, Default)]
pub struct InboundActivity {
    /// Identifier of the caller, when the activity has one.
    pub caller_id: Option<String>,
    /// Role the caller plays.
    pub caller_role: Option<ParticipantRole>,
    /// Identifier of the recipient agent.
    pub recipient_id: Option<String>,
    /// Role the recipient plays.
    pub recipient_role: Option<ParticipantRole>,
    /// Conversation the activity belongs to.
    pub conversation_id: Option<String>,
    /// Channel the activity arrived on.
    pub channel_id: Option<String>,
    /// Event source, for event-driven invocations without a caller.
    pub event_source: Option<String>,
    /// Tenant the activity is scoped to; omitted when unknown.
    pub tenant_id: Option<String>,
}

/// Classify the execution type of an activity.
///
/// Both participants flagged as the agentic-user role means one agent is
/// driving another. Otherwise the presence of a caller wins over an event
/// source, and a plain user-to-agent invocation is the default.
pub fn classify_execution_type(activity: &InboundActivity) -> ExecutionType {
    if activity.caller_role == Some(ParticipantRole::AgenticUser)
        && activity.recipient_role == Some(ParticipantRole::AgenticUser)
    {
        return ExecutionType::AgentToAgent;
    }
    if activity.caller_id.is_some() {
        return ExecutionType::UserToAgent;
    }
    if activity.event_source.is_some() {
        return ExecutionType::EventToAgent;
    }
    ExecutionType::UserToAgent
}

/// Extract the caller identity pair, if present.
pub fn extract_caller(activity: &InboundActivity) -> Vec<(&'static str, String)> {
    match &activity.caller_id {
        Some(caller_id) => vec![(semconv::CALLER_ID, caller_id.clone())],
        None => Vec::new(),
    }
}

/// Extract the target-agent identity pair, if present.
pub fn extract_target_agent(activity: &InboundActivity) -> Vec<(&'static str, String)> {
    match &activity.recipient_id {
        Some(recipient_id) => vec![(semconv::AGENT_ID, recipient_id.clone())],
        None => Vec::new(),
    }
}

/// Extract the conversation identity pair, if present.
pub fn extract_conversation(activity: &InboundActivity) -> Vec<(&'static str, String)> {
    match &activity.conversation_id {
        Some(conversation_id) => vec![(semconv::CONVERSATION_ID, conversation_id.clone())],
        None => Vec::new(),
    }
}

/// Extract channel and event-source pairs, skipping absent fields.
pub fn extract_source(activity: &InboundActivity) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(channel_id) = &activity.channel_id {
        pairs.push((semconv::CHANNEL_ID, channel_id.clone()));
    }
    if let Some(event_source) = &activity.event_source {
        pairs.push((semconv::EVENT_SOURCE, event_source.clone()));
    }
    pairs
}

/// Extract the tenant pair. Absent tenant ids are omitted, never emitted as
/// empty strings.
pub fn extract_tenant(activity: &InboundActivity) -> Vec<(&'static str, String)> {
    match &activity.tenant_id {
        Some(tenant_id) if !tenant_id.trim().is_empty() => {
            vec![(semconv::TENANT_ID, tenant_id.clone())]
        }
        _ => Vec::new(),
    }
}

/// Extract the execution-type pair. Always emits exactly one pair.
pub fn extract_execution_type(activity: &InboundActivity) -> Vec<(&'static str, String)> {
    vec![(
        semconv::EXECUTION_TYPE,
        classify_execution_type(activity).as_str().to_string(),
    )]
}

/// Extract every propagated pair from an activity, in a stable order.
pub fn extract_all(activity: &InboundActivity) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    pairs.extend(extract_caller(activity));
    pairs.extend(extract_target_agent(activity));
    pairs.extend(extract_conversation(activity));
    pairs.extend(extract_source(activity));
    pairs.extend(extract_tenant(activity));
    pairs.extend(extract_execution_type(activity));
    pairs
}

/// Guard restoring the prior execution context when dropped.
#[must_use = "baggage is removed again as soon as the guard is dropped"]
pub struct BaggageGuard {
    _guard: ContextGuard,
}

/// Build baggage from an activity and install it on the current context.
///
/// The returned guard restores the previous context when it drops, so the
/// modification is scoped even when an error unwinds through it.
pub fn attach(activity: &InboundActivity) -> BaggageGuard {
    let pairs = extract_all(activity);
    let cx = Context::map_current(|cx| {
        cx.with_baggage(
            pairs
                .into_iter()
                .map(|(key, value)| KeyValue::new(key, value)),
        )
    });
    BaggageGuard {
        _guard: cx.attach(),
    }
}

/// Stamp every propagated pair directly onto a scope's attributes.
pub fn annotate_scope(scope: &mut Scope, activity: &InboundActivity) {
    for (key, value) in extract_all(activity) {
        scope.record_attribute(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_activity() -> InboundActivity {
        InboundActivity {
            caller_id: Some("user-7".to_string()),
            caller_role: Some(ParticipantRole::User),
            recipient_id: Some("agent-42".to_string()),
            recipient_role: Some(ParticipantRole::Bot),
            conversation_id: Some("conv-1".to_string()),
            channel_id: Some("msteams".to_string()),
            event_source: None,
            tenant_id: Some("tenant-9".to_string()),
        }
    }

    #[test]
    fn test_agent_to_agent_classification() {
        let activity = InboundActivity {
            caller_id: Some("agent-a".to_string()),
            caller_role: Some(ParticipantRole::AgenticUser),
            recipient_role: Some(ParticipantRole::AgenticUser),
            ..Default::default()
        };
        assert_eq!(
            classify_execution_type(&activity),
            ExecutionType::AgentToAgent
        );
    }

    #[test]
    fn test_caller_presence_wins_over_event_source() {
        let activity = InboundActivity {
            caller_id: Some("user-1".to_string()),
            event_source: Some("webhook".to_string()),
            ..Default::default()
        };
        assert_eq!(
            classify_execution_type(&activity),
            ExecutionType::UserToAgent
        );
    }

    #[test]
    fn test_event_source_without_caller() {
        let activity = InboundActivity {
            event_source: Some("scheduler".to_string()),
            ..Default::default()
        };
        assert_eq!(
            classify_execution_type(&activity),
            ExecutionType::EventToAgent
        );
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let activity = InboundActivity::default();
        assert!(extract_caller(&activity).is_empty());
        assert!(extract_tenant(&activity).is_empty());
        assert!(extract_source(&activity).is_empty());

        // Execution type always emits.
        let pairs = extract_execution_type(&activity);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, semconv::EXECUTION_TYPE);
    }

    #[test]
    fn test_blank_tenant_is_omitted() {
        let activity = InboundActivity {
            tenant_id: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(extract_tenant(&activity).is_empty());
    }

    #[test]
    fn test_extract_all_order_and_content() {
        let pairs = extract_all(&user_activity());
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                semconv::CALLER_ID,
                semconv::AGENT_ID,
                semconv::CONVERSATION_ID,
                semconv::CHANNEL_ID,
                semconv::TENANT_ID,
                semconv::EXECUTION_TYPE,
            ]
        );
    }

    #[test]
    fn test_attach_restores_prior_context() {
        let activity = user_activity();
        {
            let _baggage = attach(&activity);
            let cx = Context::current();
            assert!(cx.baggage().get(semconv::TENANT_ID).is_some());
        }
        let cx = Context::current();
        assert!(cx.baggage().get(semconv::TENANT_ID).is_none());
    }
}
