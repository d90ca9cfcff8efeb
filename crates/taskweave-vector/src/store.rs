use crate::embedding::cosine_similarity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskweave_core::{TaskweaveError, TaskweaveResult};
use tokio::sync::RwLock;

/// The four collections the orchestrator writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Tasks,
    AgentExecutions,
    KnowledgeBase,
    AgentMemory,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Tasks,
        Collection::AgentExecutions,
        Collection::KnowledgeBase,
        Collection::AgentMemory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::AgentExecutions => "agent_executions",
            Collection::KnowledgeBase => "knowledge_base",
            Collection::AgentMemory => "agent_memory",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One embedded record inside a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub document: String,
    pub created_at: DateTime<Utc>,
}

/// A match returned by a semantic query.
///
/// `similarity` is `1 - distance` where distance is cosine distance, so a
/// perfect match scores 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub document: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub similarity: f32,
}

/// Equality filter over record metadata (the `where` clause of a query).
pub type MetadataFilter = HashMap<String, serde_json::Value>;

/// Abstract store backend with collection semantics.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Insert records, creating the collection on first touch.
    async fn add(&self, collection: Collection, records: Vec<VectorRecord>) -> TaskweaveResult<()>;

    /// Top-n most similar records, optionally restricted by a metadata filter.
    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> TaskweaveResult<Vec<QueryMatch>>;

    /// Number of records in a collection.
    async fn count(&self, collection: Collection) -> TaskweaveResult<usize>;
}

/// In-memory backend using brute-force cosine scoring.
pub struct InMemoryBackend {
    collections: RwLock<HashMap<Collection, Vec<VectorRecord>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filter(record: &VectorRecord, filter: Option<&MetadataFilter>) -> bool {
    match filter {
        None => true,
        Some(clauses) => clauses
            .iter()
            .all(|(key, expected)| record.metadata.get(key) == Some(expected)),
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn add(&self, collection: Collection, records: Vec<VectorRecord>) -> TaskweaveResult<()> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection).or_default();
        for record in records {
            // Same-id re-adds replace the prior record.
            entries.retain(|r| r.id != record.id);
            entries.push(record);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> TaskweaveResult<Vec<QueryMatch>> {
        if embedding.is_empty() {
            return Err(TaskweaveError::Vector("Empty query embedding".to_string()));
        }

        let collections = self.collections.read().await;
        let Some(entries) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<QueryMatch> = entries
            .iter()
            .filter(|r| matches_filter(r, filter))
            .map(|r| QueryMatch {
                id: r.id.clone(),
                document: r.document.clone(),
                metadata: r.metadata.clone(),
                similarity: cosine_similarity(embedding, &r.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(n_results);

        Ok(scored)
    }

    async fn count(&self, collection: Collection) -> TaskweaveResult<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map_or(0, |c| c.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, embedding: Vec<f32>, meta: &[(&str, serde_json::Value)]) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            embedding,
            metadata: meta
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            document: format!("doc for {id}"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let store = InMemoryBackend::new();
        assert_eq!(store.count(Collection::Tasks).await.unwrap(), 0);

        store
            .add(Collection::Tasks, vec![record("t1", vec![1.0, 0.0], &[])])
            .await
            .unwrap();
        assert_eq!(store.count(Collection::Tasks).await.unwrap(), 1);
        // Other collections untouched
        assert_eq!(store.count(Collection::KnowledgeBase).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_id_replaces() {
        let store = InMemoryBackend::new();
        store
            .add(Collection::Tasks, vec![record("t1", vec![1.0, 0.0], &[])])
            .await
            .unwrap();
        store
            .add(Collection::Tasks, vec![record("t1", vec![0.0, 1.0], &[])])
            .await
            .unwrap();
        assert_eq!(store.count(Collection::Tasks).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let store = InMemoryBackend::new();
        store
            .add(
                Collection::AgentExecutions,
                vec![
                    record("near", vec![0.9, 0.1, 0.0], &[]),
                    record("far", vec![0.0, 0.0, 1.0], &[]),
                ],
            )
            .await
            .unwrap();

        let matches = store
            .query(Collection::AgentExecutions, &[1.0, 0.0, 0.0], 2, None)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "near");
        assert!(matches[0].similarity > matches[1].similarity);
    }

    #[tokio::test]
    async fn test_query_metadata_filter() {
        let store = InMemoryBackend::new();
        store
            .add(
                Collection::AgentMemory,
                vec![
                    record("m1", vec![1.0, 0.0], &[("agent_id", json!("s1"))]),
                    record("m2", vec![0.9, 0.1], &[("agent_id", json!("s2"))]),
                ],
            )
            .await
            .unwrap();

        let mut filter = MetadataFilter::new();
        filter.insert("agent_id".to_string(), json!("s1"));
        let matches = store
            .query(Collection::AgentMemory, &[1.0, 0.0], 10, Some(&filter))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "m1");
    }

    #[tokio::test]
    async fn test_query_empty_collection() {
        let store = InMemoryBackend::new();
        let matches = store
            .query(Collection::KnowledgeBase, &[1.0], 5, None)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_query_empty_embedding_rejected() {
        let store = InMemoryBackend::new();
        assert!(store.query(Collection::Tasks, &[], 5, None).await.is_err());
    }

    #[tokio::test]
    async fn test_query_truncates_to_n() {
        let store = InMemoryBackend::new();
        let records = (0..10)
            .map(|i| record(&format!("r{i}"), vec![1.0, i as f32 * 0.01], &[]))
            .collect();
        store.add(Collection::Tasks, records).await.unwrap();

        let matches = store
            .query(Collection::Tasks, &[1.0, 0.0], 3, None)
            .await
            .unwrap();
        assert_eq!(matches.len(), 3);
    }
}
