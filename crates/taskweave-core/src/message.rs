use crate::tool::{ToolCall, ToolResponsePart};
use serde::{Deserialize, Serialize};

/// One entry in an agent's conversation context.
///
/// Tool traffic is structured rather than stringly-typed: assistant tool
/// requests and their responses carry parsed payloads end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ContextMessage {
    System { text: String },
    User { text: String },
    Assistant { text: String },
    AssistantToolCall { calls: Vec<ToolCall> },
    ToolResponse { parts: Vec<ToolResponsePart> },
}

impl ContextMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant { text: text.into() }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self::AssistantToolCall { calls }
    }

    pub fn tool_response(parts: Vec<ToolResponsePart>) -> Self {
        Self::ToolResponse { parts }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }

    /// Serialized form used for token estimation: what would actually be
    /// sent to the provider for this message.
    pub fn estimation_text(&self) -> String {
        match self {
            Self::System { text } | Self::User { text } | Self::Assistant { text } => text.clone(),
            Self::AssistantToolCall { calls } => {
                serde_json::to_string(calls).unwrap_or_default()
            }
            Self::ToolResponse { parts } => serde_json::to_string(parts).unwrap_or_default(),
        }
    }
}

/// Parsed reply from one LLM generation.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmReply {
    Text(String),
    ToolCalls(Vec<ToolCall>),
    Structured(serde_json::Value),
}

impl LlmReply {
    pub fn has_tool_calls(&self) -> bool {
        matches!(self, Self::ToolCalls(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_role_tags() {
        let json = serde_json::to_value(ContextMessage::system("hi")).unwrap();
        assert_eq!(json["role"], "system");
        let json = serde_json::to_value(ContextMessage::tool_calls(vec![ToolCall::new(
            "web_search",
            json!({"query": "rust"}),
        )]))
        .unwrap();
        assert_eq!(json["role"], "assistant_tool_call");
    }

    #[test]
    fn test_estimation_text_for_tool_traffic() {
        let msg = ContextMessage::tool_response(vec![ToolResponsePart::new(
            "summarize",
            json!({"summary": "short"}),
        )]);
        let text = msg.estimation_text();
        assert!(text.contains("summarize"));
        assert!(text.contains("short"));
    }
}
