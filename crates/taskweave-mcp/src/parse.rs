use crate::provider::ProviderReply;
use taskweave_core::LlmReply;

/// Extract a JSON value from model text.
///
/// Preference order: the first fenced ```json block, then any fenced
/// block, then the raw text. Scalars are not treated as structured output;
/// a bare number or word stays text.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    for candidate in fenced_blocks(text) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate.trim()) {
            if value.is_object() || value.is_array() {
                return Some(value);
            }
        }
    }

    match serde_json::from_str::<serde_json::Value>(text.trim()) {
        Ok(value) if value.is_object() || value.is_array() => Some(value),
        _ => None,
    }
}

/// All fenced code blocks in the text, ```json blocks first.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut json_blocks = Vec::new();
    let mut other_blocks = Vec::new();

    let mut rest = text;
    while let Some(start) = rest.find("```") {
        let after_fence = &rest[start + 3..];
        let Some(end) = after_fence.find("```") else {
            break;
        };
        let block = &after_fence[..end];

        // The fence line may carry a language tag.
        let (tag, body) = match block.find('\n') {
            Some(nl) => (block[..nl].trim(), &block[nl + 1..]),
            None => ("", block),
        };

        if tag.eq_ignore_ascii_case("json") {
            json_blocks.push(body);
        } else {
            other_blocks.push(body);
        }

        rest = &after_fence[end + 3..];
    }

    json_blocks.extend(other_blocks);
    json_blocks
}

/// Classify a provider reply into the engine-facing sum type.
///
/// Provider tool calls always win; otherwise structured text is parsed out
/// of the reply, and anything else stays text.
pub fn classify_reply(reply: ProviderReply) -> LlmReply {
    if !reply.tool_calls.is_empty() {
        return LlmReply::ToolCalls(reply.tool_calls);
    }

    let text = reply.text.unwrap_or_default();
    match extract_json(&text) {
        Some(value) => LlmReply::Structured(value),
        None => LlmReply::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskweave_core::ToolCall;

    #[test]
    fn test_fenced_json_block_preferred() {
        let text = "Here is the plan:\n```json\n{\"result\": 42}\n```\nDone.";
        assert_eq!(extract_json(text), Some(json!({"result": 42})));
    }

    #[test]
    fn test_untagged_fence_accepted() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), Some(json!({"a": 1})));
    }

    #[test]
    fn test_raw_json_fallback() {
        assert_eq!(extract_json("{\"b\": [1, 2]}"), Some(json!({"b": [1, 2]})));
    }

    #[test]
    fn test_plain_text_is_none() {
        assert_eq!(extract_json("The answer is 42."), None);
    }

    #[test]
    fn test_scalar_stays_text() {
        assert_eq!(extract_json("42"), None);
        let reply = classify_reply(ProviderReply {
            text: Some("42".to_string()),
            tool_calls: vec![],
        });
        assert_eq!(reply, LlmReply::Text("42".to_string()));
    }

    #[test]
    fn test_json_fence_wins_over_other_fences() {
        let text = "```python\nprint('x')\n```\n```json\n{\"ok\": true}\n```";
        assert_eq!(extract_json(text), Some(json!({"ok": true})));
    }

    #[test]
    fn test_tool_calls_win() {
        let reply = classify_reply(ProviderReply {
            text: Some("calling tools".to_string()),
            tool_calls: vec![ToolCall::new("web_search", json!({"query": "x"}))],
        });
        assert!(reply.has_tool_calls());
    }

    #[test]
    fn test_structured_classification() {
        let reply = classify_reply(ProviderReply {
            text: Some("```json\n{\"result\": \"done\"}\n```".to_string()),
            tool_calls: vec![],
        });
        assert_eq!(reply, LlmReply::Structured(json!({"result": "done"})));
    }
}
