use async_trait::async_trait;
use serde_json::Value;
use taskweave_core::TaskweaveResult;

/// Metadata describing a tool's interface.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub parameters_schema: Value,
}

/// A named side-effecting capability an agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    async fn execute(&self, arguments: Value) -> TaskweaveResult<Value>;
}
