use crate::decompose::Decomposition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskweave_eval::{AgentEvaluation, SystemEvaluation};
use taskweave_core::{Priority, TaskStatus};
use uuid::Uuid;

/// Evaluations attached to a finished task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvaluations {
    pub agents: HashMap<String, AgentEvaluation>,
    pub system: Option<SystemEvaluation>,
}

/// A user-submitted unit of work, owned exclusively by the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub description: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<Decomposition>,
    pub agent_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluations: Option<TaskEvaluations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    pub fn new(
        description: impl Into<String>,
        priority: Priority,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            priority,
            due_date,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
            overall_score: None,
            decomposition: None,
            agent_count: 0,
            final_result: None,
            evaluations: None,
            error: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
