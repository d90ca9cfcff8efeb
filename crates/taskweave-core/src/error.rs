use thiserror::Error;

pub type TaskweaveResult<T> = Result<T, TaskweaveError>;

#[derive(Error, Debug)]
pub enum TaskweaveError {
    #[error("Supervisor error: {0}")]
    Supervisor(String),

    #[error("Decomposition error: {0}")]
    Decomposition(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Vector store error: {0}")]
    Vector(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{message} (status {status:?})")]
    Llm {
        message: String,
        status: Option<u16>,
        details: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskweaveError {
    /// Constructor for provider failures, keeping the surfaced message uniform.
    pub fn llm(status: Option<u16>, details: impl Into<String>) -> Self {
        Self::Llm {
            message: "LLM generation failed".to_string(),
            status,
            details: details.into(),
        }
    }

    /// HTTP status carried by a provider error, if any.
    pub fn llm_status(&self) -> Option<u16> {
        match self {
            Self::Llm { status, .. } => *status,
            _ => None,
        }
    }
}
