use serde::{Deserialize, Serialize};

/// Role of an agent, selected by keyword match on the subtask description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentType {
    Researcher,
    Planner,
    Evaluator,
    Executor,
    General,
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentType::Researcher => "RESEARCHER",
            AgentType::Planner => "PLANNER",
            AgentType::Evaluator => "EVALUATOR",
            AgentType::Executor => "EXECUTOR",
            AgentType::General => "GENERAL",
        };
        write!(f, "{s}")
    }
}

/// Fixed keyword table mapping a subtask description to an agent type.
/// First matching rule wins; descriptions with no match fall back to
/// GENERAL.
pub fn agent_type_for(description: &str) -> AgentType {
    let lowered = description.to_lowercase();
    const RULES: [(&[&str], AgentType); 4] = [
        (&["research", "find", "gather"], AgentType::Researcher),
        (
            &["plan", "schedule", "organize", "break down"],
            AgentType::Planner,
        ),
        (&["evaluate", "assess", "review"], AgentType::Evaluator),
        (
            &["execute", "perform", "implement"],
            AgentType::Executor,
        ),
    ];

    for (keywords, agent_type) in RULES {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return agent_type;
        }
    }
    AgentType::General
}

impl AgentType {
    /// Fixed system instruction for this agent type.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            AgentType::Researcher => {
                "You are a research agent. Gather relevant information with your tools, \
                 cross-check sources, and report concise findings."
            }
            AgentType::Planner => {
                "You are a planning agent. Break work into ordered, actionable steps \
                 and surface dependencies and risks."
            }
            AgentType::Evaluator => {
                "You are an evaluation agent. Assess the supplied material critically \
                 and justify every judgement."
            }
            AgentType::Executor => {
                "You are an execution agent. Carry the assigned work through to a \
                 concrete, verifiable result."
            }
            AgentType::General => {
                "You are a general-purpose agent. Complete the assigned subtask using \
                 the available tools as needed."
            }
        }
    }

    /// Tools this agent type may call.
    pub fn tool_whitelist(&self) -> Vec<String> {
        let tools: &[&str] = match self {
            AgentType::Researcher => &["web_search", "summarize", "retrieve_documents"],
            AgentType::Planner => &["retrieve_documents"],
            AgentType::Evaluator => &["retrieve_documents", "summarize"],
            AgentType::Executor => &["web_search", "summarize"],
            AgentType::General => &["web_search", "summarize", "retrieve_documents"],
        };
        tools.iter().map(|s| s.to_string()).collect()
    }
}
