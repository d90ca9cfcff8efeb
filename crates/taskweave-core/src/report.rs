use crate::status::AgentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution counters attached to a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub execution_time_ms: u64,
    pub tool_calls_made: u32,
}

/// Immutable record emitted when an agent reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    /// Equals the subtask id the agent was bound to.
    pub agent_id: String,
    pub task_assigned: String,
    pub agent_type: String,
    pub status: AgentStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: serde_json::Value,
    pub reasoning: String,
    pub tools_used: Vec<String>,
    pub stats: AgentStats,
}

impl AgentReport {
    /// Synthesize an error report for an agent that never ran or whose
    /// runtime failed outside its own error handling.
    pub fn synthesized_error(
        agent_id: impl Into<String>,
        task_assigned: impl Into<String>,
        agent_type: impl Into<String>,
        status: AgentStatus,
        detail: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            agent_id: agent_id.into(),
            task_assigned: task_assigned.into(),
            agent_type: agent_type.into(),
            status,
            start_time: Some(now),
            end_time: Some(now),
            result: serde_json::json!({ "error": detail.into() }),
            reasoning: "Agent did not produce a result.".to_string(),
            tools_used: Vec::new(),
            stats: AgentStats::default(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.status,
            AgentStatus::Error | AgentStatus::BlockedError | AgentStatus::Stalled
        )
    }
}
