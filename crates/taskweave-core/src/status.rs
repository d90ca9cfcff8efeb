use serde::{Deserialize, Serialize};

/// Priority assigned to a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::TaskweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(crate::TaskweaveError::Supervisor(format!(
                "Invalid priority: {other}"
            ))),
        }
    }
}

/// Lifecycle status of a task, owned by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Decomposing,
    InProgress,
    Evaluating,
    Completed,
    CompletedWithErrors,
    Error,
}

impl TaskStatus {
    /// Whether this status is terminal for the task lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::CompletedWithErrors | TaskStatus::Error
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Decomposing => "decomposing",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Evaluating => "evaluating",
            TaskStatus::Completed => "completed",
            TaskStatus::CompletedWithErrors => "completed_with_errors",
            TaskStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::TaskweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "decomposing" => Ok(TaskStatus::Decomposing),
            "in_progress" => Ok(TaskStatus::InProgress),
            "evaluating" => Ok(TaskStatus::Evaluating),
            "completed" => Ok(TaskStatus::Completed),
            "completed_with_errors" => Ok(TaskStatus::CompletedWithErrors),
            "error" => Ok(TaskStatus::Error),
            other => Err(crate::TaskweaveError::Supervisor(format!(
                "Invalid task status: {other}"
            ))),
        }
    }
}

/// Per-agent state machine status.
///
/// `Waiting` and `ReadyToExecute` are informational for observers; the
/// scheduler only acts on `Pending` and the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Waiting,
    ReadyToExecute,
    InProgress,
    Completed,
    Error,
    BlockedError,
    Stalled,
}

impl AgentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentStatus::Completed
                | AgentStatus::Error
                | AgentStatus::BlockedError
                | AgentStatus::Stalled
        )
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Waiting => "waiting",
            AgentStatus::ReadyToExecute => "ready_to_execute",
            AgentStatus::InProgress => "in_progress",
            AgentStatus::Completed => "completed",
            AgentStatus::Error => "error",
            AgentStatus::BlockedError => "blocked_error",
            AgentStatus::Stalled => "stalled",
        };
        write!(f, "{s}")
    }
}
