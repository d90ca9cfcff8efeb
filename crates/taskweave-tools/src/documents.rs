use crate::tool::{Tool, ToolDescriptor};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use taskweave_core::{TaskweaveError, TaskweaveResult};
use taskweave_vector::{Collection, VectorGateway};

/// Semantic document retrieval over the knowledge-base collection.
pub struct RetrieveDocumentsTool {
    descriptor: ToolDescriptor,
    vectors: Arc<VectorGateway>,
}

impl RetrieveDocumentsTool {
    pub fn new(vectors: Arc<VectorGateway>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: "retrieve_documents".to_string(),
                description: "Retrieve documents semantically related to a query from the knowledge base.".to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "What to look for"
                        },
                        "top_k": {
                            "type": "integer",
                            "description": "Number of documents to return (default 3)"
                        }
                    },
                    "required": ["query"]
                }),
            },
            vectors,
        }
    }
}

#[async_trait]
impl Tool for RetrieveDocumentsTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, arguments: Value) -> TaskweaveResult<Value> {
        let query = arguments["query"].as_str().unwrap_or_default().trim();
        if query.is_empty() {
            return Err(TaskweaveError::Tool(
                "retrieve_documents requires a query".to_string(),
            ));
        }
        let top_k = arguments["top_k"].as_u64().unwrap_or(3) as usize;

        let matches = self
            .vectors
            .search(Collection::KnowledgeBase, query, top_k, None)
            .await?;

        let documents: Vec<Value> = matches
            .iter()
            .map(|m| {
                json!({
                    "id": m.id,
                    "document": m.document,
                    "similarity": m.similarity,
                })
            })
            .collect();

        Ok(json!({ "query": query, "documents": documents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use taskweave_vector::{HashedEmbedding, InMemoryBackend};

    fn vectors() -> Arc<VectorGateway> {
        Arc::new(VectorGateway::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(HashedEmbedding::default()),
        ))
    }

    #[tokio::test]
    async fn test_retrieves_related_documents() {
        let gw = vectors();
        gw.store(
            Collection::KnowledgeBase,
            "k1",
            "evaluation of the market research pipeline",
            HashMap::new(),
        )
        .await
        .unwrap();

        let tool = RetrieveDocumentsTool::new(gw);
        let out = tool
            .execute(json!({"query": "market research evaluation"}))
            .await
            .unwrap();
        let docs = out["documents"].as_array().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], "k1");
    }

    #[tokio::test]
    async fn test_empty_knowledge_base() {
        let tool = RetrieveDocumentsTool::new(vectors());
        let out = tool.execute(json!({"query": "anything"})).await.unwrap();
        assert!(out["documents"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requires_query() {
        let tool = RetrieveDocumentsTool::new(vectors());
        assert!(tool.execute(json!({"top_k": 2})).await.is_err());
    }
}
