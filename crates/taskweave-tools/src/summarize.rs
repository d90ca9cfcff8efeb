use crate::tool::{Tool, ToolDescriptor};
use async_trait::async_trait;
use serde_json::{json, Value};
use taskweave_core::{TaskweaveError, TaskweaveResult};

/// Extractive summarization tool: keeps the leading sentences up to a
/// length budget. A model-backed summarizer can replace this behind the
/// same descriptor.
pub struct SummarizeTool {
    descriptor: ToolDescriptor,
}

const DEFAULT_MAX_CHARS: usize = 400;

impl SummarizeTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "summarize".to_string(),
                description: "Summarize a block of text.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "The text to summarize"
                        },
                        "max_chars": {
                            "type": "integer",
                            "description": "Maximum summary length in characters"
                        }
                    },
                    "required": ["text"]
                }),
            },
        }
    }

    fn leading_sentences(text: &str, budget: usize) -> String {
        let mut summary = String::new();
        for sentence in text.split_inclusive(['.', '!', '?']) {
            if !summary.is_empty() && summary.len() + sentence.len() > budget {
                break;
            }
            summary.push_str(sentence);
            if summary.len() >= budget {
                break;
            }
        }
        if summary.is_empty() {
            // No sentence boundary inside the budget; hard-truncate.
            text.chars().take(budget).collect()
        } else {
            summary.trim().to_string()
        }
    }
}

impl Default for SummarizeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SummarizeTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, arguments: Value) -> TaskweaveResult<Value> {
        let text = arguments["text"].as_str().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(TaskweaveError::Tool("summarize requires text".to_string()));
        }
        let budget = arguments["max_chars"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_CHARS);

        let summary = Self::leading_sentences(text, budget);

        Ok(json!({
            "summary": summary,
            "original_chars": text.len(),
            "summary_chars": summary.len(),
        }))
    }
}
