//! Named, schema-typed tools invoked by agents during the LLM loop.
//!
//! The [`ToolRegistry`] is the contract: agents see descriptors filtered to
//! their whitelist, and every execution materializes as a [`taskweave_core::ToolResult`]
//! (success or error) rather than propagating failures into the agent.

/// Semantic document retrieval backed by the vector gateway.
pub mod documents;
/// Tool registry with whitelist filtering.
pub mod registry;
/// Extractive summarization.
pub mod summarize;
/// Tool trait and descriptor.
pub mod tool;
/// Offline web-search stand-in.
pub mod web_search;

pub use documents::RetrieveDocumentsTool;
pub use registry::ToolRegistry;
pub use summarize::SummarizeTool;
pub use tool::{Tool, ToolDescriptor};
pub use web_search::WebSearchTool;

use std::sync::Arc;
use taskweave_vector::VectorGateway;

/// Register the reference tool set.
pub fn register_reference_tools(registry: &mut ToolRegistry, vectors: Arc<VectorGateway>) {
    registry.register(Arc::new(WebSearchTool::default()));
    registry.register(Arc::new(SummarizeTool::new()));
    registry.register(Arc::new(RetrieveDocumentsTool::new(vectors)));
}
