use crate::registry::{agent_type_for, AgentType};
use serde::{Deserialize, Serialize};

/// Configuration binding one agent to one subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Equals the subtask id; unique within a run.
    pub id: String,
    pub task_assigned: String,
    pub agent_type: AgentType,
    pub system_instruction: String,
    pub tools: Vec<String>,
    pub parallel_group: String,
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<u8>,
}

impl AgentConfig {
    /// Derive a config from a subtask description using the fixed keyword
    /// registry for type, instruction and tool whitelist.
    pub fn from_subtask(
        id: impl Into<String>,
        description: impl Into<String>,
        dependencies: Vec<String>,
        parallel_group: impl Into<String>,
        complexity: Option<u8>,
    ) -> Self {
        let description = description.into();
        let agent_type = agent_type_for(&description);
        Self {
            id: id.into(),
            task_assigned: description,
            agent_type,
            system_instruction: agent_type.system_instruction().to_string(),
            tools: agent_type.tool_whitelist(),
            parallel_group: parallel_group.into(),
            dependencies,
            complexity,
        }
    }
}
