use crate::provider::{ProviderContent, ProviderReply};
use async_trait::async_trait;
use taskweave_core::TaskweaveResult;
use taskweave_tools::ToolDescriptor;

/// Abstraction over the LLM provider.
///
/// The orchestrator, agents and evaluator all generate through this trait,
/// which keeps the provider swappable and lets tests inject deterministic
/// backends. `tools` declares the callable tools for this generation; the
/// model can only emit function calls for tools declared here. Callers
/// with no tool surface (decomposition, evaluation) pass an empty slice.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(
        &self,
        contents: &[ProviderContent],
        tools: &[ToolDescriptor],
    ) -> TaskweaveResult<ProviderReply>;
}
