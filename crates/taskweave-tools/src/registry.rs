use crate::tool::{Tool, ToolDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use taskweave_core::{ToolCall, ToolResult};
use tracing::{info, warn};

/// Central registry for all available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.descriptor().name.clone();
        info!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn list_descriptors(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Descriptors restricted to an agent's whitelist. Unknown names are
    /// skipped with a warning rather than failing the agent.
    pub fn descriptors_for(&self, whitelist: &[String]) -> Vec<ToolDescriptor> {
        whitelist
            .iter()
            .filter_map(|name| match self.tools.get(name) {
                Some(tool) => Some(tool.descriptor().clone()),
                None => {
                    warn!(tool = %name, "Whitelisted tool not registered");
                    None
                }
            })
            .collect()
    }

    /// Execute a tool call. Failures never propagate: an unknown tool or a
    /// tool error materializes as [`ToolResult::Err`] so the agent loop can
    /// feed it back to the LLM and continue.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "Unknown tool requested");
            return ToolResult::err(
                format!("Unknown tool: {}", call.name),
                "tool is not registered",
            );
        };

        match tool.execute(call.arguments.clone()).await {
            Ok(value) => ToolResult::ok(value),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::err(format!("Tool '{}' failed", call.name), e.to_string())
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
