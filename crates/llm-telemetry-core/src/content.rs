//! Plain-text extraction from structured message payloads.
//!
//! Messages are recorded on spans as JSON-encoded lists of
//! `{"role": ..., "parts": [{"type": "text", "content": ...}, ...]}`
//! objects. The extractors below pull the human-readable text back out so
//! the built-in enricher can replace raw payloads with plain text before
//! export. Malformed payloads degrade gracefully: the raw value is returned
//! unchanged rather than failing the traced operation.

use opentelemetry::{Array, KeyValue, StringValue, Value};
use opentelemetry_sdk::trace::SpanData;

use crate::export::{EnrichedSpan, MergedSpan, SpanEnricher};
use crate::semconv;

/// Extract the text content of user messages from a JSON message list.
pub fn extract_input_content(raw: &str) -> Vec<String> {
    extract_role_text(raw, "user")
}

/// Extract the text content of assistant messages from a JSON message list.
pub fn extract_output_content(raw: &str) -> Vec<String> {
    extract_role_text(raw, "assistant")
}

fn extract_role_text(raw: &str, role: &str) -> Vec<String> {
    let messages: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(serde_json::Value::Array(messages)) => messages,
        // Not a message list at all: hand back the raw value unchanged.
        Ok(_) | Err(_) => return vec![raw.to_string()],
    };

    let mut texts = Vec::new();
    for message in &messages {
        if message.get("role").and_then(|r| r.as_str()) != Some(role) {
            continue;
        }
        let Some(parts) = message.get("parts").and_then(|p| p.as_array()) else {
            continue;
        };
        for part in parts {
            if part.get("type").and_then(|t| t.as_str()) != Some("text") {
                continue;
            }
            if let Some(content) = part.get("content").and_then(|c| c.as_str()) {
                texts.push(content.to_string());
            }
        }
    }
    texts
}

/// Built-in enricher replacing structured message payloads with plain-text
/// lists. This is the enricher framework adapters register by default.
pub struct MessageContentEnricher;

impl SpanEnricher for MessageContentEnricher {
    fn enrich<'a>(&self, span: &'a SpanData) -> anyhow::Result<EnrichedSpan<'a>> {
        let mut replacements = Vec::new();

        for attribute in &span.attributes {
            let extractor = match attribute.key.as_str() {
                semconv::INPUT_MESSAGES => extract_input_content,
                semconv::OUTPUT_MESSAGES => extract_output_content,
                _ => continue,
            };
            if let Value::String(raw) = &attribute.value {
                let texts: Vec<StringValue> = extractor(raw.as_str())
                    .into_iter()
                    .map(StringValue::from)
                    .collect();
                replacements.push(KeyValue::new(
                    attribute.key.clone(),
                    Value::Array(Array::String(texts)),
                ));
            }
        }

        if replacements.is_empty() {
            Ok(EnrichedSpan::Unchanged)
        } else {
            Ok(EnrichedSpan::Merged(MergedSpan::new(span, replacements)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED_MESSAGES: &str = r#"[
        {"role":"user","parts":[{"type":"text","content":"Hi"}]},
        {"role":"assistant","parts":[{"type":"tool_call"}]}
    ]"#;

    #[test]
    fn test_extract_input_content() {
        assert_eq!(extract_input_content(MIXED_MESSAGES), vec!["Hi"]);
    }

    #[test]
    fn test_extract_output_content_no_assistant_text() {
        assert!(extract_output_content(MIXED_MESSAGES).is_empty());
    }

    #[test]
    fn test_multiple_text_parts_preserve_order() {
        let raw = r#"[
            {"role":"user","parts":[{"type":"text","content":"first"},{"type":"text","content":"second"}]},
            {"role":"user","parts":[{"type":"text","content":"third"}]}
        ]"#;
        assert_eq!(
            extract_input_content(raw),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_malformed_json_returns_raw_value() {
        let raw = "{not valid json";
        assert_eq!(extract_input_content(raw), vec![raw.to_string()]);
    }

    #[test]
    fn test_non_array_payload_returns_raw_value() {
        let raw = r#"{"role":"user"}"#;
        assert_eq!(extract_output_content(raw), vec![raw.to_string()]);
    }

    #[test]
    fn test_messages_without_parts_are_skipped() {
        let raw = r#"[{"role":"user","content":"legacy shape"}]"#;
        assert!(extract_input_content(raw).is_empty());
    }
}
