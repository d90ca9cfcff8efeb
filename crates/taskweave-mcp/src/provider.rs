use serde::{Deserialize, Serialize};
use taskweave_core::{ContextMessage, ToolCall};
use tracing::warn;

/// Provider-side role. The provider only distinguishes the model's own
/// turns from everything it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    User,
    Model,
}

/// One part of a provider content entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderPart {
    Text {
        text: String,
    },
    FunctionCall {
        name: String,
        args: serde_json::Value,
    },
    FunctionResponse {
        name: String,
        response: serde_json::Value,
    },
}

/// One content entry in a provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderContent {
    pub role: ProviderRole,
    pub parts: Vec<ProviderPart>,
}

/// What one generation returned, before classification.
#[derive(Debug, Clone, Default)]
pub struct ProviderReply {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Map the internal message buffer onto provider contents.
///
/// system and assistant text map to `model`; user text maps to `user`;
/// assistant tool calls become `model` functionCall parts; tool responses
/// become `user` functionResponse parts. Function-call arguments that are
/// not JSON objects degrade to a text part, since the provider rejects
/// scalar argument payloads.
pub fn to_provider_contents(messages: &[ContextMessage]) -> Vec<ProviderContent> {
    messages
        .iter()
        .map(|message| match message {
            ContextMessage::System { text } | ContextMessage::Assistant { text } => {
                ProviderContent {
                    role: ProviderRole::Model,
                    parts: vec![ProviderPart::Text { text: text.clone() }],
                }
            }
            ContextMessage::User { text } => ProviderContent {
                role: ProviderRole::User,
                parts: vec![ProviderPart::Text { text: text.clone() }],
            },
            ContextMessage::AssistantToolCall { calls } => ProviderContent {
                role: ProviderRole::Model,
                parts: calls
                    .iter()
                    .map(|call| {
                        if call.arguments.is_object() {
                            ProviderPart::FunctionCall {
                                name: call.name.clone(),
                                args: call.arguments.clone(),
                            }
                        } else {
                            warn!(
                                tool = %call.name,
                                "Non-object tool arguments; degrading to text part"
                            );
                            ProviderPart::Text {
                                text: format!("Tool Call: {} {}", call.name, call.arguments),
                            }
                        }
                    })
                    .collect(),
            },
            ContextMessage::ToolResponse { parts } => ProviderContent {
                role: ProviderRole::User,
                parts: parts
                    .iter()
                    .map(|part| ProviderPart::FunctionResponse {
                        name: part.name.clone(),
                        response: part.response.clone(),
                    })
                    .collect(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskweave_core::ToolResponsePart;

    #[test]
    fn test_role_mapping() {
        let contents = to_provider_contents(&[
            ContextMessage::system("sys"),
            ContextMessage::user("ask"),
            ContextMessage::assistant("answer"),
        ]);

        assert_eq!(contents[0].role, ProviderRole::Model);
        assert_eq!(contents[1].role, ProviderRole::User);
        assert_eq!(contents[2].role, ProviderRole::Model);
    }

    #[test]
    fn test_tool_call_framing() {
        let contents = to_provider_contents(&[ContextMessage::tool_calls(vec![ToolCall::new(
            "web_search",
            json!({"query": "rust"}),
        )])]);

        assert_eq!(contents[0].role, ProviderRole::Model);
        assert_eq!(
            contents[0].parts[0],
            ProviderPart::FunctionCall {
                name: "web_search".to_string(),
                args: json!({"query": "rust"}),
            }
        );
    }

    #[test]
    fn test_tool_response_framing() {
        let contents = to_provider_contents(&[ContextMessage::tool_response(vec![
            ToolResponsePart::new("web_search", json!({"results": []})),
        ])]);

        assert_eq!(contents[0].role, ProviderRole::User);
        assert_eq!(
            contents[0].parts[0],
            ProviderPart::FunctionResponse {
                name: "web_search".to_string(),
                response: json!({"results": []}),
            }
        );
    }

    #[test]
    fn test_scalar_tool_args_degrade_to_text() {
        let contents = to_provider_contents(&[ContextMessage::tool_calls(vec![ToolCall::new(
            "summarize",
            json!("just a string"),
        )])]);

        assert!(matches!(
            &contents[0].parts[0],
            ProviderPart::Text { text } if text.starts_with("Tool Call: summarize")
        ));
    }
}
