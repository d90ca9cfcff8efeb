use crate::events::{AgentEvent, EventCallback};
use crate::executor::AgentExecutor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use taskweave_agent::AgentConfig;
use taskweave_core::{AgentReport, AgentStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Overall outcome status of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    CompletedSuccessfully,
    CompletedWithErrors,
}

/// What an engine run hands back: one report per submitted agent, always.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub reports: HashMap<String, AgentReport>,
    pub status: EngineStatus,
}

/// The workflow scheduler.
///
/// Drives every submitted agent to a terminal state, honoring dependency
/// order and parallel-group batching. Groups within one ready batch are
/// processed sequentially in lexicographic label order; agents within a
/// group run concurrently. A dependency is satisfied only by a non-error
/// report, so failures cascade to dependents as `blocked_error` instead of
/// executing them against missing inputs.
pub struct WorkflowEngine {
    executor: Arc<dyn AgentExecutor>,
}

impl WorkflowEngine {
    pub fn new(executor: Arc<dyn AgentExecutor>) -> Self {
        Self { executor }
    }

    /// Run all agents to terminal states. Never fails: scheduler-level
    /// problems materialize as `stalled`/`blocked_error`/`error` reports.
    pub async fn run(
        &self,
        agents: Vec<AgentConfig>,
        on_event: EventCallback,
        cancel: CancellationToken,
    ) -> EngineOutcome {
        let mut reports: HashMap<String, AgentReport> = HashMap::new();
        let mut completed: HashSet<String> = HashSet::new();
        let mut waiting_emitted: HashSet<String> = HashSet::new();

        info!(agents = agents.len(), "Engine run starting");

        for agent in &agents {
            on_event(AgentEvent::status_change(&agent.id, AgentStatus::Pending));
        }

        while completed.len() < agents.len() {
            if cancel.is_cancelled() {
                self.finalize_cancelled(&agents, &mut reports, &mut completed, &on_event);
                break;
            }

            let ready: Vec<&AgentConfig> = agents
                .iter()
                .filter(|a| !completed.contains(&a.id))
                .filter(|a| {
                    a.dependencies.iter().all(|dep| {
                        reports.get(dep).map_or(false, |r| !r.is_error())
                    })
                })
                .collect();

            if ready.is_empty() {
                self.resolve_blocked(&agents, &mut reports, &mut completed, &on_event);
                break;
            }

            let ready_ids: HashSet<&str> = ready.iter().map(|a| a.id.as_str()).collect();
            for agent in &agents {
                if !completed.contains(&agent.id)
                    && !ready_ids.contains(agent.id.as_str())
                    && waiting_emitted.insert(agent.id.clone())
                {
                    on_event(AgentEvent::status_change(&agent.id, AgentStatus::Waiting));
                }
            }

            let mut groups: BTreeMap<&str, Vec<&AgentConfig>> = BTreeMap::new();
            for agent in &ready {
                groups
                    .entry(agent.parallel_group.as_str())
                    .or_default()
                    .push(*agent);
            }

            for (group, cohort) in groups {
                if cancel.is_cancelled() {
                    break;
                }
                debug!(group = %group, size = cohort.len(), "Dispatching cohort");

                let mut handles = Vec::with_capacity(cohort.len());
                for agent in cohort {
                    let context: HashMap<String, serde_json::Value> = agent
                        .dependencies
                        .iter()
                        .filter_map(|dep| {
                            reports.get(dep).map(|r| (dep.clone(), r.result.clone()))
                        })
                        .collect();

                    on_event(AgentEvent::status_change(
                        &agent.id,
                        AgentStatus::ReadyToExecute,
                    ));
                    on_event(AgentEvent::status_change(&agent.id, AgentStatus::InProgress));

                    let executor = self.executor.clone();
                    let config = agent.clone();
                    let agent_cancel = cancel.clone();
                    handles.push((
                        agent.clone(),
                        tokio::spawn(async move {
                            executor.execute(&config, context, agent_cancel).await
                        }),
                    ));
                }

                // The cohort completes as a whole before the next group runs.
                for (config, handle) in handles {
                    let report = match handle.await {
                        Ok(report) => report,
                        Err(e) => {
                            warn!(agent_id = %config.id, error = %e, "Agent task panicked");
                            AgentReport::synthesized_error(
                                &config.id,
                                &config.task_assigned,
                                config.agent_type.to_string(),
                                AgentStatus::Error,
                                format!("agent task panicked: {e}"),
                            )
                        }
                    };
                    completed.insert(report.agent_id.clone());
                    on_event(AgentEvent::terminal(report.clone()));
                    reports.insert(report.agent_id.clone(), report);
                }
            }
        }

        let status = if reports.values().any(|r| r.is_error()) {
            EngineStatus::CompletedWithErrors
        } else {
            EngineStatus::CompletedSuccessfully
        };

        info!(
            agents = agents.len(),
            status = ?status,
            "Engine run finished"
        );

        EngineOutcome { reports, status }
    }

    /// No agent is ready but work remains: cascade errors to dependents,
    /// then mark the rest stalled.
    fn resolve_blocked(
        &self,
        agents: &[AgentConfig],
        reports: &mut HashMap<String, AgentReport>,
        completed: &mut HashSet<String>,
        on_event: &EventCallback,
    ) {
        // Cascade to fixpoint: anything depending on an errored agent is
        // itself an error, which can unblock further cascades.
        loop {
            let blocked: Vec<&AgentConfig> = agents
                .iter()
                .filter(|a| !completed.contains(&a.id))
                .filter(|a| {
                    a.dependencies
                        .iter()
                        .any(|dep| reports.get(dep).is_some_and(|r| r.is_error()))
                })
                .collect();

            if blocked.is_empty() {
                break;
            }

            for agent in blocked {
                warn!(agent_id = %agent.id, "Agent blocked by errored dependency");
                let report = AgentReport::synthesized_error(
                    &agent.id,
                    &agent.task_assigned,
                    agent.agent_type.to_string(),
                    AgentStatus::BlockedError,
                    "a dependency ended in error",
                );
                completed.insert(agent.id.clone());
                on_event(AgentEvent::terminal(report.clone()));
                reports.insert(agent.id.clone(), report);
            }
        }

        // Whatever remains has an unsatisfiable dependency: a cycle or an
        // unknown id that validation should have rejected.
        let stalled: Vec<&AgentConfig> = agents
            .iter()
            .filter(|a| !completed.contains(&a.id))
            .collect();
        for agent in stalled {
            warn!(agent_id = %agent.id, "Agent stalled on unsatisfiable dependency");
            let report = AgentReport::synthesized_error(
                &agent.id,
                &agent.task_assigned,
                agent.agent_type.to_string(),
                AgentStatus::Stalled,
                "unsatisfiable dependency (cycle or unknown id)",
            );
            completed.insert(agent.id.clone());
            on_event(AgentEvent::terminal(report.clone()));
            reports.insert(agent.id.clone(), report);
        }
    }

    fn finalize_cancelled(
        &self,
        agents: &[AgentConfig],
        reports: &mut HashMap<String, AgentReport>,
        completed: &mut HashSet<String>,
        on_event: &EventCallback,
    ) {
        let remaining: Vec<&AgentConfig> = agents
            .iter()
            .filter(|a| !completed.contains(&a.id))
            .collect();
        for agent in remaining {
            let report = AgentReport::synthesized_error(
                &agent.id,
                &agent.task_assigned,
                agent.agent_type.to_string(),
                AgentStatus::Error,
                "run cancelled",
            );
            completed.insert(agent.id.clone());
            on_event(AgentEvent::terminal(report.clone()));
            reports.insert(agent.id.clone(), report);
        }
    }
}
