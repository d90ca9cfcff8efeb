use crate::embedding::EmbeddingProvider;
use crate::store::{Collection, MetadataFilter, QueryMatch, VectorBackend, VectorRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use taskweave_core::TaskweaveResult;
use tracing::warn;

/// Record counts per collection, served at /system/stats and broadcast
/// after task completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCounts {
    pub tasks: usize,
    pub agent_executions: usize,
    pub knowledge_base: usize,
    pub agent_memory: usize,
}

/// Facade over the backend and the embedding provider.
///
/// Owns the embed-then-store and embed-then-query plumbing so callers deal
/// in text and metadata only.
pub struct VectorGateway {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorGateway {
    pub fn new(backend: Arc<dyn VectorBackend>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { backend, embedder }
    }

    /// Embed and store one document. Returns an error to the caller, but
    /// orchestration call sites treat store failures as non-fatal.
    pub async fn store(
        &self,
        collection: Collection,
        id: impl Into<String>,
        document: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> TaskweaveResult<()> {
        let document = document.into();
        let embedding = self.embedder.embed(&document).await?;
        let record = VectorRecord {
            id: id.into(),
            embedding,
            metadata,
            document,
            created_at: Utc::now(),
        };
        self.backend.add(collection, vec![record]).await
    }

    /// Same as [`store`](Self::store) but swallows (and logs) failures.
    /// Used on hot paths where persistence must not take down a run.
    pub async fn store_best_effort(
        &self,
        collection: Collection,
        id: impl Into<String>,
        document: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) {
        let id = id.into();
        if let Err(e) = self.store(collection, id.clone(), document, metadata).await {
            warn!(collection = %collection, id = %id, error = %e, "Vector store write failed");
        }
    }

    /// Semantic query by text.
    pub async fn search(
        &self,
        collection: Collection,
        query: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> TaskweaveResult<Vec<QueryMatch>> {
        let embedding = self.embedder.embed(query).await?;
        self.backend
            .query(collection, &embedding, n_results, filter)
            .await
    }

    pub async fn count(&self, collection: Collection) -> TaskweaveResult<usize> {
        self.backend.count(collection).await
    }

    /// Counts across all four collections; failures degrade to zero.
    pub async fn counts(&self) -> CollectionCounts {
        let mut counts = CollectionCounts::default();
        for collection in Collection::ALL {
            let n = match self.backend.count(collection).await {
                Ok(n) => n,
                Err(e) => {
                    warn!(collection = %collection, error = %e, "Collection count failed");
                    0
                }
            };
            match collection {
                Collection::Tasks => counts.tasks = n,
                Collection::AgentExecutions => counts.agent_executions = n,
                Collection::KnowledgeBase => counts.knowledge_base = n,
                Collection::AgentMemory => counts.agent_memory = n,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashedEmbedding;
    use crate::store::InMemoryBackend;
    use serde_json::json;

    fn gateway() -> VectorGateway {
        VectorGateway::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(HashedEmbedding::default()),
        )
    }

    #[tokio::test]
    async fn test_store_and_search() {
        let gw = gateway();
        gw.store(
            Collection::Tasks,
            "t1",
            "research electric vehicle market trends",
            HashMap::new(),
        )
        .await
        .unwrap();
        gw.store(
            Collection::Tasks,
            "t2",
            "plan a team offsite in the mountains",
            HashMap::new(),
        )
        .await
        .unwrap();

        let matches = gw
            .search(Collection::Tasks, "electric vehicle research", 1, None)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "t1");
    }

    #[tokio::test]
    async fn test_counts_cover_all_collections() {
        let gw = gateway();
        gw.store(Collection::KnowledgeBase, "k1", "system evaluation", HashMap::new())
            .await
            .unwrap();
        gw.store(
            Collection::AgentMemory,
            "m1",
            "remembered episode",
            [("agent_id".to_string(), json!("s1"))].into(),
        )
        .await
        .unwrap();

        let counts = gw.counts().await;
        assert_eq!(counts.knowledge_base, 1);
        assert_eq!(counts.agent_memory, 1);
        assert_eq!(counts.tasks, 0);
    }

    #[tokio::test]
    async fn test_store_best_effort_swallows_errors() {
        let gw = gateway();
        // Empty document fails embedding; best-effort must not panic or err.
        gw.store_best_effort(Collection::Tasks, "t1", "  ", HashMap::new())
            .await;
        assert_eq!(gw.count(Collection::Tasks).await.unwrap(), 0);
    }
}
