use serde::{Deserialize, Serialize};

/// A request from the LLM to invoke a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments to pass to the tool.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of executing a [`ToolCall`].
///
/// Tool failures never abort the calling agent; they travel back to the LLM
/// as the `Err` variant of this union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ToolResult {
    Ok { value: serde_json::Value },
    Err { message: String, details: String },
}

impl ToolResult {
    pub fn ok(value: serde_json::Value) -> Self {
        Self::Ok { value }
    }

    pub fn err(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Err {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self, Self::Err { .. })
    }

    /// The payload fed back to the LLM as a function response.
    pub fn response_value(&self) -> serde_json::Value {
        match self {
            Self::Ok { value } => value.clone(),
            Self::Err { message, details } => serde_json::json!({
                "error": message,
                "details": details,
            }),
        }
    }
}

/// One named tool response inside a tool message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponsePart {
    pub name: String,
    pub response: serde_json::Value,
}

impl ToolResponsePart {
    pub fn new(name: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            response,
        }
    }
}
