use crate::task::Task;
use serde::Serialize;
use std::collections::HashMap;
use taskweave_core::AgentStatus;
use taskweave_vector::CollectionCounts;
use uuid::Uuid;

/// Fan-out event carried to SSE subscribers.
///
/// Mirrors the named SSE events: `tasks` carries the full task array,
/// `agents` the full taskId → agentId → status map, `stats` the collection
/// counts after a run finishes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateEvent {
    Tasks {
        tasks: Vec<Task>,
    },
    Agents {
        agents: HashMap<Uuid, HashMap<String, AgentStatus>>,
    },
    Stats {
        counts: CollectionCounts,
    },
}

impl UpdateEvent {
    /// The SSE event name this update maps to.
    pub fn event_name(&self) -> &'static str {
        match self {
            UpdateEvent::Tasks { .. } => "tasks",
            UpdateEvent::Agents { .. } => "agents",
            UpdateEvent::Stats { .. } => "stats",
        }
    }

    /// The SSE payload: the inner data without the kind tag.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            UpdateEvent::Tasks { tasks } => serde_json::to_value(tasks),
            UpdateEvent::Agents { agents } => serde_json::to_value(agents),
            UpdateEvent::Stats { counts } => serde_json::to_value(counts),
        }
        .unwrap_or(serde_json::Value::Null)
    }
}
