//! Model context protocol: the bounded conversation buffer and the LLM
//! session around it.
//!
//! # Main types
//!
//! - [`ContextBuffer`] — message ring bounded by count and token estimate.
//! - [`McpSession`] — per-agent session: context management + generation.
//! - [`LlmBackend`] — provider abstraction; [`GeminiBackend`] is the REST
//!   implementation, tests inject scripted ones.

/// Bounded conversation buffer.
pub mod context;
/// Gemini REST backend.
pub mod gemini;
/// Provider backend trait.
pub mod llm;
/// Reply parsing and classification.
pub mod parse;
/// Provider content framing.
pub mod provider;
/// Per-agent LLM session.
pub mod session;

pub use context::{ContextBuffer, DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use llm::LlmBackend;
pub use taskweave_tools::ToolDescriptor;
pub use parse::{classify_reply, extract_json};
pub use provider::{to_provider_contents, ProviderContent, ProviderPart, ProviderReply, ProviderRole};
pub use session::McpSession;
