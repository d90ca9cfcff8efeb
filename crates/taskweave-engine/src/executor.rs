use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use taskweave_agent::{AgentConfig, AgentRuntime};
use taskweave_core::AgentReport;
use taskweave_memory::AgentMemory;
use taskweave_mcp::LlmBackend;
use taskweave_tools::ToolRegistry;
use taskweave_vector::VectorGateway;
use tokio_util::sync::CancellationToken;

/// Seam between the scheduler and the agent runtime.
///
/// The engine only needs "run this config with this context to a report";
/// tests substitute scripted executors, production wires [`RuntimeExecutor`].
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        config: &AgentConfig,
        context: HashMap<String, Value>,
        cancel: CancellationToken,
    ) -> AgentReport;
}

/// Factory producing the LLM backend for one agent. Lets tests hand each
/// agent its own scripted backend while production shares a single one.
pub type BackendFactory = Arc<dyn Fn(&AgentConfig) -> Arc<dyn LlmBackend> + Send + Sync>;

/// Production executor: builds an [`AgentRuntime`] per invocation.
pub struct RuntimeExecutor {
    backend_factory: BackendFactory,
    tools: Arc<ToolRegistry>,
    memory: Arc<AgentMemory>,
    vectors: Arc<VectorGateway>,
}

impl RuntimeExecutor {
    pub fn new(
        backend_factory: BackendFactory,
        tools: Arc<ToolRegistry>,
        memory: Arc<AgentMemory>,
        vectors: Arc<VectorGateway>,
    ) -> Self {
        Self {
            backend_factory,
            tools,
            memory,
            vectors,
        }
    }

    /// Convenience constructor for the common single-backend case.
    pub fn with_backend(
        backend: Arc<dyn LlmBackend>,
        tools: Arc<ToolRegistry>,
        memory: Arc<AgentMemory>,
        vectors: Arc<VectorGateway>,
    ) -> Self {
        Self::new(
            Arc::new(move |_| backend.clone()),
            tools,
            memory,
            vectors,
        )
    }
}

#[async_trait]
impl AgentExecutor for RuntimeExecutor {
    async fn execute(
        &self,
        config: &AgentConfig,
        context: HashMap<String, Value>,
        cancel: CancellationToken,
    ) -> AgentReport {
        let backend = (self.backend_factory)(config);
        let runtime = AgentRuntime::new(
            config.clone(),
            backend,
            self.tools.clone(),
            self.memory.clone(),
            self.vectors.clone(),
        );
        runtime.run(context, cancel).await
    }
}
