use crate::tool::{Tool, ToolDescriptor};
use async_trait::async_trait;
use serde_json::{json, Value};
use taskweave_core::{TaskweaveError, TaskweaveResult};
use tracing::info;

/// Web search tool.
///
/// The search provider is an external collaborator; this implementation is
/// a deterministic offline stand-in that echoes the query into a ranked
/// result list so agents exercise the full tool path without network.
pub struct WebSearchTool {
    descriptor: ToolDescriptor,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(max_results: usize) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "web_search".to_string(),
                description: "Search the web for information on a topic.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        },
                        "num_results": {
                            "type": "integer",
                            "description": "Number of results to return (default 3)"
                        }
                    },
                    "required": ["query"]
                }),
            },
            max_results,
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, arguments: Value) -> TaskweaveResult<Value> {
        let query = arguments["query"].as_str().unwrap_or_default().trim();
        if query.is_empty() {
            return Err(TaskweaveError::Tool("web_search requires a query".to_string()));
        }

        let requested = arguments["num_results"].as_u64().unwrap_or(3) as usize;
        let n = requested.clamp(1, self.max_results);

        info!(query = %query, n = n, "web_search invoked");

        let results: Vec<Value> = (1..=n)
            .map(|rank| {
                json!({
                    "rank": rank,
                    "title": format!("Result {rank} for \"{query}\""),
                    "snippet": format!(
                        "Reference material covering {query}, item {rank}."
                    ),
                    "url": format!("https://search.invalid/{}/{rank}",
                        query.replace(' ', "-")),
                })
            })
            .collect();

        Ok(json!({ "query": query, "results": results }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_returns_requested_count() {
        let tool = WebSearchTool::default();
        let out = tool
            .execute(json!({"query": "rust async", "num_results": 2}))
            .await
            .unwrap();
        assert_eq!(out["results"].as_array().unwrap().len(), 2);
        assert_eq!(out["query"], "rust async");
    }

    #[tokio::test]
    async fn test_search_clamps_to_max() {
        let tool = WebSearchTool::new(3);
        let out = tool
            .execute(json!({"query": "q", "num_results": 50}))
            .await
            .unwrap();
        assert_eq!(out["results"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let tool = WebSearchTool::default();
        assert!(tool.execute(json!({})).await.is_err());
    }
}
