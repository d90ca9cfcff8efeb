use crate::decompose::Decomposer;
use crate::task::{Task, TaskEvaluations};
use crate::updates::UpdateEvent;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use taskweave_agent::AgentConfig;
use taskweave_core::{AgentStatus, Priority, TaskStatus, TaskweaveError, TaskweaveResult};
use taskweave_engine::{
    AgentEvent, AgentExecutor, EngineStatus, EventCallback, RuntimeExecutor, WorkflowEngine,
};
use taskweave_eval::{AgentEvaluator, SystemEvaluator};
use taskweave_memory::AgentMemory;
use taskweave_mcp::LlmBackend;
use taskweave_tools::ToolRegistry;
use taskweave_vector::{Collection, CollectionCounts, VectorGateway};
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

struct Inner {
    tasks: RwLock<HashMap<Uuid, Task>>,
    /// Written by engine callbacks (sync context), snapshotted for readers.
    agent_statuses: std::sync::RwLock<HashMap<Uuid, HashMap<String, AgentStatus>>>,
    cancellations: RwLock<HashMap<Uuid, CancellationToken>>,
    updates: broadcast::Sender<UpdateEvent>,
    decomposer: Decomposer,
    engine: WorkflowEngine,
    agent_evaluator: AgentEvaluator,
    system_evaluator: SystemEvaluator,
    vectors: Arc<VectorGateway>,
}

/// The task lifecycle supervisor.
///
/// Exclusive owner of every [`Task`]: all mutations funnel through its
/// methods, every transition broadcasts to subscribers, and each submitted
/// task runs its own decompose → execute → evaluate pipeline on a spawned
/// task.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    /// Production wiring: agents run through [`RuntimeExecutor`] against
    /// the shared backend, tools, memory and vector gateway.
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        tools: Arc<ToolRegistry>,
        memory: Arc<AgentMemory>,
        vectors: Arc<VectorGateway>,
    ) -> Self {
        let executor = Arc::new(RuntimeExecutor::with_backend(
            backend.clone(),
            tools,
            memory,
            vectors.clone(),
        ));
        Self::with_executor(backend, executor, vectors)
    }

    /// Custom executor wiring (tests inject scripted executors here).
    pub fn with_executor(
        backend: Arc<dyn LlmBackend>,
        executor: Arc<dyn AgentExecutor>,
        vectors: Arc<VectorGateway>,
    ) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tasks: RwLock::new(HashMap::new()),
                agent_statuses: std::sync::RwLock::new(HashMap::new()),
                cancellations: RwLock::new(HashMap::new()),
                updates,
                decomposer: Decomposer::new(backend.clone()),
                engine: WorkflowEngine::new(executor),
                agent_evaluator: AgentEvaluator::new(backend.clone()),
                system_evaluator: SystemEvaluator::new(backend, vectors.clone()),
                vectors,
            }),
        }
    }

    /// Subscribe to task/agent/stats updates.
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.inner.updates.subscribe()
    }

    /// Submit a task and start its pipeline.
    pub async fn submit(
        &self,
        description: &str,
        priority: Priority,
        due_date: Option<DateTime<Utc>>,
    ) -> TaskweaveResult<Task> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TaskweaveError::Supervisor(
                "task description is required".to_string(),
            ));
        }

        let task = Task::new(description, priority, due_date);
        let task_id = task.id;
        self.inner.tasks.write().await.insert(task_id, task.clone());
        info!(task_id = %task_id, priority = %priority, "Task submitted");
        self.broadcast_tasks().await;

        // Persist the description so later agents can retrieve related
        // prior tasks semantically.
        self.inner
            .vectors
            .store_best_effort(
                Collection::Tasks,
                task_id.to_string(),
                description,
                [("task_id".to_string(), json!(task_id.to_string()))].into(),
            )
            .await;

        let inner = self.inner.clone();
        tokio::spawn(async move {
            Self::run_pipeline(inner, task_id).await;
        });

        Ok(task)
    }

    pub async fn get(&self, task_id: Uuid) -> Option<Task> {
        self.inner.tasks.read().await.get(&task_id).cloned()
    }

    /// All tasks, oldest first.
    pub async fn list(&self) -> Vec<Task> {
        let tasks = self.inner.tasks.read().await;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by_key(|t| t.created_at);
        all
    }

    /// Delete a task, cancelling its pipeline if still running. In-flight
    /// agent reports are not rolled back; the registry entry just goes away.
    pub async fn delete(&self, task_id: Uuid) -> bool {
        if let Some(token) = self.inner.cancellations.write().await.remove(&task_id) {
            token.cancel();
        }
        let removed = self.inner.tasks.write().await.remove(&task_id).is_some();
        if removed {
            self.inner
                .agent_statuses
                .write()
                .expect("status lock poisoned")
                .remove(&task_id);
            info!(task_id = %task_id, "Task deleted");
            self.broadcast_tasks().await;
        }
        removed
    }

    /// Manual status transition from the external API. Broadcast but not
    /// interpreted: it does not halt or advance the pipeline.
    pub async fn update_status(&self, task_id: Uuid, status: TaskStatus) -> Option<Task> {
        let updated = {
            let mut tasks = self.inner.tasks.write().await;
            let task = tasks.get_mut(&task_id)?;
            task.status = status;
            task.touch();
            Some(task.clone())
        };
        self.broadcast_tasks().await;
        updated
    }

    pub async fn update_priority(&self, task_id: Uuid, priority: Priority) -> Option<Task> {
        let updated = {
            let mut tasks = self.inner.tasks.write().await;
            let task = tasks.get_mut(&task_id)?;
            task.priority = priority;
            task.touch();
            Some(task.clone())
        };
        self.broadcast_tasks().await;
        updated
    }

    /// Current agent statuses for one task.
    pub async fn agent_statuses(&self, task_id: Uuid) -> Option<HashMap<String, AgentStatus>> {
        self.inner
            .agent_statuses
            .read()
            .expect("status lock poisoned")
            .get(&task_id)
            .cloned()
    }

    pub async fn stats(&self) -> CollectionCounts {
        self.inner.vectors.counts().await
    }

    // -- pipeline --

    async fn run_pipeline(inner: Arc<Inner>, task_id: Uuid) {
        let cancel = CancellationToken::new();
        inner
            .cancellations
            .write()
            .await
            .insert(task_id, cancel.clone());

        if let Err(e) = Self::pipeline(&inner, task_id, cancel).await {
            error!(task_id = %task_id, error = %e, "Task pipeline failed");
            {
                let mut tasks = inner.tasks.write().await;
                if let Some(task) = tasks.get_mut(&task_id) {
                    task.status = TaskStatus::Error;
                    task.error = Some(e.to_string());
                    task.completed_at = Some(Utc::now());
                    task.touch();
                }
            }
            Self::broadcast_tasks_inner(&inner).await;
        }

        inner.cancellations.write().await.remove(&task_id);
    }

    async fn pipeline(
        inner: &Arc<Inner>,
        task_id: Uuid,
        cancel: CancellationToken,
    ) -> TaskweaveResult<()> {
        let description = inner
            .tasks
            .read()
            .await
            .get(&task_id)
            .map(|t| t.description.clone())
            .ok_or_else(|| TaskweaveError::Supervisor("task vanished".to_string()))?;

        // Phase 1: decompose
        Self::set_status(inner, task_id, TaskStatus::Decomposing).await;
        let decomposition = inner.decomposer.decompose(&description).await?;

        let configs: Vec<AgentConfig> = decomposition
            .subtasks
            .iter()
            .map(|s| {
                AgentConfig::from_subtask(
                    s.subtask_id.clone(),
                    s.assignment_text(),
                    s.dependencies.clone(),
                    s.parallel_group.clone(),
                    s.estimated_complexity,
                )
            })
            .collect();

        {
            let mut tasks = inner.tasks.write().await;
            let task = tasks
                .get_mut(&task_id)
                .ok_or_else(|| TaskweaveError::Supervisor("task vanished".to_string()))?;
            task.decomposition = Some(decomposition);
            task.agent_count = configs.len();
            task.touch();
        }

        // Phase 2: execute
        Self::set_status(inner, task_id, TaskStatus::InProgress).await;
        {
            let mut statuses = inner.agent_statuses.write().expect("status lock poisoned");
            statuses.insert(
                task_id,
                configs
                    .iter()
                    .map(|c| (c.id.clone(), AgentStatus::Pending))
                    .collect(),
            );
        }
        Self::broadcast_agents_inner(inner);

        let callback: EventCallback = {
            let inner = inner.clone();
            Arc::new(move |event: AgentEvent| {
                {
                    let mut statuses =
                        inner.agent_statuses.write().expect("status lock poisoned");
                    if let Some(map) = statuses.get_mut(&task_id) {
                        map.insert(event.agent_id.clone(), event.status);
                    }
                }
                Self::broadcast_agents_inner(&inner);
            })
        };

        let outcome = inner.engine.run(configs, callback, cancel).await;

        // Phase 3: evaluate
        Self::set_status(inner, task_id, TaskStatus::Evaluating).await;
        let mut agent_evaluations = HashMap::new();
        for (agent_id, report) in &outcome.reports {
            let evaluation = inner.agent_evaluator.evaluate(report, &description).await;
            agent_evaluations.insert(agent_id.clone(), evaluation);
        }
        let system_evaluation = inner
            .system_evaluator
            .evaluate(task_id, &description, &agent_evaluations)
            .await;

        // Finalize
        let final_status = match outcome.status {
            EngineStatus::CompletedSuccessfully => TaskStatus::Completed,
            EngineStatus::CompletedWithErrors => TaskStatus::CompletedWithErrors,
        };
        let final_result = json!(outcome
            .reports
            .iter()
            .map(|(id, r)| {
                (
                    id.clone(),
                    json!({ "status": r.status, "result": r.result }),
                )
            })
            .collect::<HashMap<String, serde_json::Value>>());

        {
            let mut tasks = inner.tasks.write().await;
            let task = tasks
                .get_mut(&task_id)
                .ok_or_else(|| TaskweaveError::Supervisor("task vanished".to_string()))?;
            task.status = final_status;
            task.overall_score = Some(system_evaluation.average_agent_score);
            task.final_result = Some(final_result);
            task.evaluations = Some(TaskEvaluations {
                agents: agent_evaluations,
                system: Some(system_evaluation),
            });
            task.completed_at = Some(Utc::now());
            task.touch();
        }
        info!(task_id = %task_id, status = %final_status, "Task finished");
        Self::broadcast_tasks_inner(inner).await;
        Self::broadcast_stats_inner(inner).await;

        Ok(())
    }

    async fn set_status(inner: &Arc<Inner>, task_id: Uuid, status: TaskStatus) {
        {
            let mut tasks = inner.tasks.write().await;
            if let Some(task) = tasks.get_mut(&task_id) {
                task.status = status;
                task.touch();
            }
        }
        Self::broadcast_tasks_inner(inner).await;
    }

    async fn broadcast_tasks(&self) {
        Self::broadcast_tasks_inner(&self.inner).await;
    }

    async fn broadcast_tasks_inner(inner: &Arc<Inner>) {
        let tasks = inner.tasks.read().await;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by_key(|t| t.created_at);
        let _ = inner.updates.send(UpdateEvent::Tasks { tasks: all });
    }

    fn broadcast_agents_inner(inner: &Arc<Inner>) {
        let agents = inner
            .agent_statuses
            .read()
            .expect("status lock poisoned")
            .clone();
        let _ = inner.updates.send(UpdateEvent::Agents { agents });
    }

    async fn broadcast_stats_inner(inner: &Arc<Inner>) {
        let counts = inner.vectors.counts().await;
        let _ = inner.updates.send(UpdateEvent::Stats { counts });
    }
}
