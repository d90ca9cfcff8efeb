use crate::context::ContextBuffer;
use crate::llm::LlmBackend;
use crate::parse::classify_reply;
use crate::provider::to_provider_contents;
use std::sync::Arc;
use taskweave_core::{ContextMessage, LlmReply, TaskweaveResult};
use taskweave_tools::ToolDescriptor;
use tracing::debug;

/// The conversation manager around one LLM session.
///
/// Owns the bounded buffer, the backend handle, and the tool descriptors
/// declared to the provider; every generation frames the full buffer into
/// provider contents, records the model's turn back into the buffer, and
/// returns the classified reply.
pub struct McpSession {
    buffer: ContextBuffer,
    backend: Arc<dyn LlmBackend>,
    tools: Vec<ToolDescriptor>,
}

impl McpSession {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            buffer: ContextBuffer::default(),
            backend,
            tools: Vec::new(),
        }
    }

    pub fn with_buffer(backend: Arc<dyn LlmBackend>, buffer: ContextBuffer) -> Self {
        Self {
            buffer,
            backend,
            tools: Vec::new(),
        }
    }

    /// Declare the tools the model may call in this session. The model can
    /// only emit function calls for descriptors declared here.
    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn set_system_instruction(&mut self, text: impl Into<String>) {
        self.buffer.set_system_instruction(text);
    }

    pub fn add_to_context(&mut self, message: ContextMessage) {
        self.buffer.push(message);
    }

    pub fn buffer(&self) -> &ContextBuffer {
        &self.buffer
    }

    /// Generate one reply. An optional prompt is appended as a user message
    /// first. The model's turn is recorded into the buffer on success; on
    /// provider failure a system note is recorded before the error
    /// propagates.
    pub async fn generate(
        &mut self,
        prompt: Option<&str>,
    ) -> TaskweaveResult<LlmReply> {
        if let Some(prompt) = prompt {
            self.buffer.push(ContextMessage::user(prompt));
        }

        let contents = to_provider_contents(self.buffer.messages());
        debug!(
            messages = contents.len(),
            tokens = self.buffer.estimated_tokens(),
            tools = self.tools.len(),
            "Generating LLM reply"
        );

        let reply = match self.backend.generate(&contents, &self.tools).await {
            Ok(reply) => reply,
            Err(e) => {
                self.buffer
                    .push(ContextMessage::system(format!("LLM generation failed: {e}")));
                return Err(e);
            }
        };

        let classified = classify_reply(reply);
        match &classified {
            LlmReply::Text(text) => self.buffer.push(ContextMessage::assistant(text.clone())),
            LlmReply::Structured(value) => self
                .buffer
                .push(ContextMessage::assistant(value.to_string())),
            LlmReply::ToolCalls(calls) => self
                .buffer
                .push(ContextMessage::tool_calls(calls.clone())),
        }

        Ok(classified)
    }
}
