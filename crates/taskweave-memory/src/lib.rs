//! Agent memory: a short-term per-agent key/value map and a long-term
//! embedding-backed episodic store.
//!
//! Short-term entries live for the duration of a run and never leave the
//! process. Long-term episodes are written through the vector gateway into
//! the `agent_memory` collection and recalled semantically, filtered by
//! agent id.

use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use taskweave_core::TaskweaveResult;
use taskweave_vector::{Collection, MetadataFilter, QueryMatch, VectorGateway};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// What kind of episode is being remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeKind {
    Success,
    Error,
}

impl EpisodeKind {
    fn as_str(&self) -> &'static str {
        match self {
            EpisodeKind::Success => "success",
            EpisodeKind::Error => "error",
        }
    }
}

/// Shared memory service for all agents in the process.
pub struct AgentMemory {
    short_term: RwLock<HashMap<String, HashMap<String, Value>>>,
    vectors: Arc<VectorGateway>,
}

impl AgentMemory {
    pub fn new(vectors: Arc<VectorGateway>) -> Self {
        Self {
            short_term: RwLock::new(HashMap::new()),
            vectors,
        }
    }

    /// Store a short-term value for an agent.
    pub async fn remember(&self, agent_id: &str, key: impl Into<String>, value: Value) {
        let mut map = self.short_term.write().await;
        map.entry(agent_id.to_string())
            .or_default()
            .insert(key.into(), value);
    }

    /// Read a short-term value.
    pub async fn recall(&self, agent_id: &str, key: &str) -> Option<Value> {
        let map = self.short_term.read().await;
        map.get(agent_id).and_then(|m| m.get(key)).cloned()
    }

    /// Drop an agent's entire short-term map (end of run).
    pub async fn forget(&self, agent_id: &str) {
        let mut map = self.short_term.write().await;
        map.remove(agent_id);
    }

    /// Snapshot of an agent's short-term map.
    pub async fn snapshot(&self, agent_id: &str) -> HashMap<String, Value> {
        let map = self.short_term.read().await;
        map.get(agent_id).cloned().unwrap_or_default()
    }

    /// Persist an episode to long-term memory. Best-effort: storage
    /// failures are logged inside the gateway and do not fail the agent.
    pub async fn store_episode(
        &self,
        agent_id: &str,
        kind: EpisodeKind,
        content: Value,
    ) {
        let document = content.to_string();
        let metadata: HashMap<String, Value> = [
            ("agent_id".to_string(), json!(agent_id)),
            ("kind".to_string(), json!(kind.as_str())),
            ("stored_at".to_string(), json!(Utc::now().to_rfc3339())),
        ]
        .into();

        debug!(agent_id = %agent_id, kind = kind.as_str(), "Storing long-term episode");
        self.vectors
            .store_best_effort(
                Collection::AgentMemory,
                format!("{agent_id}:{}", Uuid::new_v4()),
                document,
                metadata,
            )
            .await;
    }

    /// Recall the top-k episodes semantically related to `query`, restricted
    /// to one agent.
    pub async fn recall_episodes(
        &self,
        agent_id: &str,
        query: &str,
        top_k: usize,
    ) -> TaskweaveResult<Vec<QueryMatch>> {
        let mut filter = MetadataFilter::new();
        filter.insert("agent_id".to_string(), json!(agent_id));
        self.vectors
            .search(Collection::AgentMemory, query, top_k, Some(&filter))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskweave_vector::{HashedEmbedding, InMemoryBackend};

    fn memory() -> AgentMemory {
        AgentMemory::new(Arc::new(VectorGateway::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(HashedEmbedding::default()),
        )))
    }

    #[tokio::test]
    async fn test_short_term_round_trip() {
        let mem = memory();
        mem.remember("s1", "partial", json!({"step": 2})).await;

        assert_eq!(mem.recall("s1", "partial").await, Some(json!({"step": 2})));
        assert_eq!(mem.recall("s1", "other").await, None);
        assert_eq!(mem.recall("s2", "partial").await, None);
    }

    #[tokio::test]
    async fn test_forget_clears_agent() {
        let mem = memory();
        mem.remember("s1", "k", json!(1)).await;
        mem.forget("s1").await;
        assert!(mem.snapshot("s1").await.is_empty());
    }

    #[tokio::test]
    async fn test_episodes_filtered_by_agent() {
        let mem = memory();
        mem.store_episode(
            "s1",
            EpisodeKind::Success,
            json!({"task": "research market trends", "result": "ok"}),
        )
        .await;
        mem.store_episode(
            "s2",
            EpisodeKind::Success,
            json!({"task": "research market trends", "result": "ok"}),
        )
        .await;

        let recalled = mem
            .recall_episodes("s1", "market trends research", 10)
            .await
            .unwrap();
        assert_eq!(recalled.len(), 1);
        assert_eq!(recalled[0].metadata["agent_id"], json!("s1"));
    }

    #[tokio::test]
    async fn test_error_episode_kind_recorded() {
        let mem = memory();
        mem.store_episode(
            "s1",
            EpisodeKind::Error,
            json!({"task": "fetch data", "error": "timeout"}),
        )
        .await;

        let recalled = mem.recall_episodes("s1", "fetch data", 5).await.unwrap();
        assert_eq!(recalled[0].metadata["kind"], json!("error"));
    }
}
