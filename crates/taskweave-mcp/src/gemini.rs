use crate::llm::LlmBackend;
use crate::provider::{ProviderContent, ProviderPart, ProviderReply, ProviderRole};
use async_trait::async_trait;
use serde::Serialize;
use taskweave_core::{TaskweaveError, TaskweaveResult, ToolCall};
use taskweave_tools::ToolDescriptor;
use tracing::warn;

/// Configuration for the Gemini generative-language backend.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    pub api_base_url: Option<String>,
}

fn default_model_id() -> String {
    "gemini-2.0-flash".to_string()
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: default_model_id(),
            api_base_url: None,
        }
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com")
    }
}

/// Gemini REST backend.
pub struct GeminiBackend {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(
        &self,
        contents: &[ProviderContent],
        tools: &[ToolDescriptor],
    ) -> TaskweaveResult<ProviderReply> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            self.config.model_id
        );

        let wire_contents: Vec<WireContent> = contents.iter().map(WireContent::from).collect();
        let mut body = serde_json::json!({ "contents": wire_contents });
        if !tools.is_empty() {
            body["tools"] = tool_declarations(tools);
        }

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TaskweaveError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TaskweaveError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TaskweaveError::llm(
                Some(status.as_u16()),
                resp_body.to_string(),
            ));
        }

        parse_gemini_response(&resp_body)
    }
}

/// The `tools` array of a generateContent request: one entry carrying the
/// functionDeclarations for every tool the model may call.
fn tool_declarations(tools: &[ToolDescriptor]) -> serde_json::Value {
    let declarations: Vec<serde_json::Value> = tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters_schema,
            })
        })
        .collect();
    serde_json::json!([{ "functionDeclarations": declarations }])
}

// -- Gemini wire types --

#[derive(Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<serde_json::Value>,
}

impl From<&ProviderContent> for WireContent {
    fn from(content: &ProviderContent) -> Self {
        let role = match content.role {
            ProviderRole::User => "user",
            ProviderRole::Model => "model",
        };
        let parts = content
            .parts
            .iter()
            .map(|part| match part {
                ProviderPart::Text { text } => serde_json::json!({ "text": text }),
                ProviderPart::FunctionCall { name, args } => serde_json::json!({
                    "functionCall": { "name": name, "args": args }
                }),
                ProviderPart::FunctionResponse { name, response } => serde_json::json!({
                    "functionResponse": { "name": name, "response": response }
                }),
            })
            .collect();
        Self { role, parts }
    }
}

pub fn parse_gemini_response(body: &serde_json::Value) -> TaskweaveResult<ProviderReply> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| TaskweaveError::llm(None, format!("Missing candidates: {body}")))?;

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for part in parts {
        if let Some(text) = part["text"].as_str() {
            text_parts.push(text.to_string());
        } else if part["functionCall"].is_object() {
            let call = &part["functionCall"];
            let name = call["name"].as_str().unwrap_or_default().to_string();
            let arguments = if call["args"].is_object() {
                call["args"].clone()
            } else {
                warn!(tool = %name, "functionCall without object args; substituting empty");
                serde_json::json!({})
            };
            tool_calls.push(ToolCall::new(name, arguments));
        }
    }

    Ok(ProviderReply {
        text: if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        },
        tool_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_response() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "the answer" }], "role": "model" }
            }]
        });
        let reply = parse_gemini_response(&body).unwrap();
        assert_eq!(reply.text.as_deref(), Some("the answer"));
        assert!(reply.tool_calls.is_empty());
    }

    #[test]
    fn test_parse_function_call_response() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "searching" },
                        { "functionCall": { "name": "web_search", "args": { "query": "rust" } } }
                    ],
                    "role": "model"
                }
            }]
        });
        let reply = parse_gemini_response(&body).unwrap();
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].name, "web_search");
        assert_eq!(reply.tool_calls[0].arguments, json!({"query": "rust"}));
        assert_eq!(reply.text.as_deref(), Some("searching"));
    }

    #[test]
    fn test_parse_missing_candidates() {
        let body = json!({"error": {"code": 500}});
        assert!(parse_gemini_response(&body).is_err());
    }

    #[test]
    fn test_wire_content_round_trip() {
        let content = ProviderContent {
            role: ProviderRole::Model,
            parts: vec![ProviderPart::FunctionCall {
                name: "summarize".to_string(),
                args: json!({"text": "t"}),
            }],
        };
        let wire = WireContent::from(&content);
        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value["role"], "model");
        assert_eq!(value["parts"][0]["functionCall"]["name"], "summarize");
    }

    #[test]
    fn test_default_base_url() {
        let config = GeminiConfig::new("key");
        assert!(config.base_url().contains("generativelanguage"));
    }

    #[test]
    fn test_tool_declarations_wire_shape() {
        let tools = vec![ToolDescriptor {
            name: "web_search".to_string(),
            description: "Search the web.".to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
        }];

        let value = tool_declarations(&tools);
        let declarations = value[0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0]["name"], "web_search");
        assert_eq!(declarations[0]["parameters"]["required"][0], "query");
    }
}
