use crate::config::AgentConfig;
use chrono::Utc;
use futures_util::future::join_all;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use taskweave_core::{
    AgentReport, AgentStats, AgentStatus, ContextMessage, LlmReply, TaskweaveError,
    TaskweaveResult, ToolResponsePart, ToolResult,
};
use taskweave_memory::{AgentMemory, EpisodeKind};
use taskweave_mcp::{LlmBackend, McpSession};
use taskweave_tools::ToolRegistry;
use taskweave_vector::{Collection, VectorGateway};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Upper bound on LLM-driven tool rounds per agent.
pub const MAX_TOOL_LOOPS: u32 = 5;

/// How many related prior tasks and long-term memories prime the context.
const PRIMING_TOP_K: usize = 3;

/// Runtime instance bound to one subtask.
///
/// Drives the MCP/tool loop and always materializes a well-formed
/// [`AgentReport`], success or failure.
pub struct AgentRuntime {
    config: AgentConfig,
    session: McpSession,
    tools: Arc<ToolRegistry>,
    memory: Arc<AgentMemory>,
    vectors: Arc<VectorGateway>,
    tool_calls_made: u32,
    tools_used: Vec<String>,
}

impl AgentRuntime {
    pub fn new(
        config: AgentConfig,
        backend: Arc<dyn LlmBackend>,
        tools: Arc<ToolRegistry>,
        memory: Arc<AgentMemory>,
        vectors: Arc<VectorGateway>,
    ) -> Self {
        // The model is only told about the tools on this agent's whitelist.
        let descriptors = tools.descriptors_for(&config.tools);
        Self {
            config,
            session: McpSession::new(backend).with_tools(descriptors),
            tools,
            memory,
            vectors,
            tool_calls_made: 0,
            tools_used: Vec::new(),
        }
    }

    /// Execute the subtask with the given dependency context.
    ///
    /// `context` maps each dependency's subtask id to its materialized
    /// result. Every path returns a report; exceptions inside the loop
    /// become `status = error` reports.
    pub async fn run(
        mut self,
        context: HashMap<String, Value>,
        cancel: CancellationToken,
    ) -> AgentReport {
        let start_time = Utc::now();
        let started = Instant::now();
        info!(
            agent_id = %self.config.id,
            agent_type = %self.config.agent_type,
            "Agent starting"
        );

        let outcome = self.execute(&context, &cancel).await;

        let end_time = Utc::now();
        let execution_time_ms = started.elapsed().as_millis() as u64;

        let report = match outcome {
            Ok((result, reasoning)) => {
                info!(
                    agent_id = %self.config.id,
                    execution_time_ms,
                    tool_calls = self.tool_calls_made,
                    "Agent completed"
                );
                AgentReport {
                    agent_id: self.config.id.clone(),
                    task_assigned: self.config.task_assigned.clone(),
                    agent_type: self.config.agent_type.to_string(),
                    status: AgentStatus::Completed,
                    start_time: Some(start_time),
                    end_time: Some(end_time),
                    result,
                    reasoning,
                    tools_used: self.tools_used.clone(),
                    stats: AgentStats {
                        execution_time_ms,
                        tool_calls_made: self.tool_calls_made,
                    },
                }
            }
            Err(e) => {
                error!(agent_id = %self.config.id, error = %e, "Agent failed");
                AgentReport {
                    agent_id: self.config.id.clone(),
                    task_assigned: self.config.task_assigned.clone(),
                    agent_type: self.config.agent_type.to_string(),
                    status: AgentStatus::Error,
                    start_time: Some(start_time),
                    end_time: Some(end_time),
                    result: json!({ "error": e.to_string() }),
                    reasoning: "Agent execution failed.".to_string(),
                    tools_used: self.tools_used.clone(),
                    stats: AgentStats {
                        execution_time_ms,
                        tool_calls_made: self.tool_calls_made,
                    },
                }
            }
        };

        self.persist(&report).await;
        report
    }

    async fn execute(
        &mut self,
        context: &HashMap<String, Value>,
        cancel: &CancellationToken,
    ) -> TaskweaveResult<(Value, String)> {
        self.prime_context(context).await;

        let mut reply = self
            .generate(
                Some(
                    "Execute your subtask now. Reason step by step, then output the \
                     final result as a JSON object with `result` and `reasoning` \
                     fields. Call tools if you need them.",
                ),
                cancel,
            )
            .await?;

        let mut loops = 0u32;
        let final_reply = loop {
            match reply {
                LlmReply::ToolCalls(calls) => {
                    if loops >= MAX_TOOL_LOOPS {
                        warn!(
                            agent_id = %self.config.id,
                            loops,
                            "Tool loop bound reached; forcing final answer"
                        );
                        self.session.add_to_context(ContextMessage::system(
                            "No more tool calls are available. Give your best final \
                             answer now.",
                        ));
                        break self
                            .generate(
                                Some("Provide your final answer without calling tools."),
                                cancel,
                            )
                            .await?;
                    }

                    self.run_tool_round(&calls, cancel).await?;
                    loops += 1;

                    reply = self
                        .generate(
                            Some(
                                "Tools executed. Produce the final answer, or call \
                                 more tools if needed.",
                            ),
                            cancel,
                        )
                        .await?;
                }
                other => break other,
            }
        };

        Ok(materialize_reply(final_reply))
    }

    /// Execute all calls of one loop iteration concurrently and feed the
    /// responses back into the context. Tool failures do not abort the
    /// agent; they travel back as error-bearing responses. Calls outside
    /// the agent's whitelist never reach the registry.
    async fn run_tool_round(
        &mut self,
        calls: &[taskweave_core::ToolCall],
        cancel: &CancellationToken,
    ) -> TaskweaveResult<()> {
        let registry = &self.tools;
        let whitelist = &self.config.tools;
        let futures = calls.iter().map(|call| async move {
            if whitelist.contains(&call.name) {
                registry.execute(call).await
            } else {
                warn!(tool = %call.name, "Tool not on this agent's whitelist");
                ToolResult::err(
                    format!("Tool '{}' is not available to this agent", call.name),
                    "not on the agent's tool whitelist",
                )
            }
        });
        let results = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(TaskweaveError::Agent("execution cancelled".to_string()));
            }
            results = join_all(futures) => results,
        };

        let mut parts = Vec::with_capacity(calls.len());
        for (call, result) in calls.iter().zip(results) {
            self.tool_calls_made += 1;
            self.tools_used.push(call.name.clone());
            parts.push(ToolResponsePart::new(
                call.name.clone(),
                result.response_value(),
            ));
        }
        self.session
            .add_to_context(ContextMessage::tool_response(parts));
        Ok(())
    }

    async fn generate(
        &mut self,
        prompt: Option<&str>,
        cancel: &CancellationToken,
    ) -> TaskweaveResult<LlmReply> {
        tokio::select! {
            _ = cancel.cancelled() => {
                Err(TaskweaveError::Agent("execution cancelled".to_string()))
            }
            reply = self.session.generate(prompt) => reply,
        }
    }

    /// Prime the MCP: identity, dependency results, related prior tasks,
    /// and long-term memories. Retrieval failures degrade to a warning.
    async fn prime_context(&mut self, context: &HashMap<String, Value>) {
        self.session.set_system_instruction(format!(
            "You are agent '{}' of type {}. {} Your subtask: {}",
            self.config.id,
            self.config.agent_type,
            self.config.system_instruction,
            self.config.task_assigned,
        ));

        if !context.is_empty() {
            let summary = serde_json::to_string_pretty(context).unwrap_or_default();
            self.session.add_to_context(ContextMessage::user(format!(
                "Results from prerequisite subtasks:\n{summary}"
            )));
        }

        match self
            .vectors
            .search(
                Collection::Tasks,
                &self.config.task_assigned,
                PRIMING_TOP_K,
                None,
            )
            .await
        {
            Ok(matches) if !matches.is_empty() => {
                let lines: Vec<String> = matches
                    .iter()
                    .map(|m| format!("- {} (similarity {:.2})", m.document, m.similarity))
                    .collect();
                self.session.add_to_context(ContextMessage::user(format!(
                    "Possibly related prior tasks:\n{}",
                    lines.join("\n")
                )));
            }
            Ok(_) => {}
            Err(e) => warn!(agent_id = %self.config.id, error = %e, "Prior-task retrieval failed"),
        }

        match self
            .memory
            .recall_episodes(&self.config.id, &self.config.task_assigned, PRIMING_TOP_K)
            .await
        {
            Ok(episodes) if !episodes.is_empty() => {
                let lines: Vec<String> =
                    episodes.iter().map(|m| format!("- {}", m.document)).collect();
                self.session.add_to_context(ContextMessage::user(format!(
                    "Relevant long-term memories:\n{}",
                    lines.join("\n")
                )));
            }
            Ok(_) => {}
            Err(e) => warn!(agent_id = %self.config.id, error = %e, "Memory recall failed"),
        }
    }

    /// Persist the report and the corresponding long-term episode.
    /// Best-effort: storage problems never change the report.
    async fn persist(&self, report: &AgentReport) {
        let document = json!({
            "agent_id": report.agent_id,
            "task": report.task_assigned,
            "status": report.status,
            "result": report.result,
            "reasoning": report.reasoning,
        })
        .to_string();
        let metadata: HashMap<String, Value> = [
            ("agent_id".to_string(), json!(report.agent_id)),
            ("status".to_string(), json!(report.status)),
        ]
        .into();
        // Subtask ids repeat across tasks; key each execution uniquely.
        self.vectors
            .store_best_effort(
                Collection::AgentExecutions,
                format!("{}:{}", report.agent_id, Uuid::new_v4()),
                document,
                metadata,
            )
            .await;

        if report.status == AgentStatus::Completed {
            self.memory
                .store_episode(
                    &report.agent_id,
                    EpisodeKind::Success,
                    json!({
                        "task": report.task_assigned,
                        "result": report.result,
                        "reasoning": report.reasoning,
                    }),
                )
                .await;
        } else {
            self.memory
                .store_episode(
                    &report.agent_id,
                    EpisodeKind::Error,
                    json!({
                        "task": report.task_assigned,
                        "error": report.result,
                    }),
                )
                .await;
        }
    }
}

/// Classify the final reply into (result, reasoning).
fn materialize_reply(reply: LlmReply) -> (Value, String) {
    match reply {
        LlmReply::Structured(value) => {
            let result = value.get("result").cloned();
            match result {
                Some(result) => {
                    let reasoning = value["reasoning"]
                        .as_str()
                        .unwrap_or("Completed.")
                        .to_string();
                    (result, reasoning)
                }
                None => (
                    value,
                    "Model returned a non-standard response shape.".to_string(),
                ),
            }
        }
        LlmReply::Text(text) => (json!(text), "Completed.".to_string()),
        LlmReply::ToolCalls(calls) => (
            json!({ "unfulfilled_tool_calls": calls }),
            "Model kept requesting tools after the loop bound.".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_materialize_structured_with_result() {
        let (result, reasoning) = materialize_reply(LlmReply::Structured(json!({
            "result": {"answer": 42},
            "reasoning": "worked it out"
        })));
        assert_eq!(result, json!({"answer": 42}));
        assert_eq!(reasoning, "worked it out");
    }

    #[test]
    fn test_materialize_bare_string() {
        let (result, reasoning) = materialize_reply(LlmReply::Text("plain answer".to_string()));
        assert_eq!(result, json!("plain answer"));
        assert_eq!(reasoning, "Completed.");
    }

    #[test]
    fn test_materialize_opaque_object() {
        let (result, reasoning) =
            materialize_reply(LlmReply::Structured(json!({"other": true})));
        assert_eq!(result, json!({"other": true}));
        assert!(reasoning.contains("non-standard"));
    }

    #[test]
    fn test_materialize_residual_tool_calls() {
        let (result, reasoning) = materialize_reply(LlmReply::ToolCalls(vec![
            taskweave_core::ToolCall::new("web_search", json!({})),
        ]));
        assert!(result["unfulfilled_tool_calls"].is_array());
        assert!(reasoning.contains("loop bound"));
    }
}
