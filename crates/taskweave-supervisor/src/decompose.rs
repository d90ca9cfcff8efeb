use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use taskweave_core::{TaskweaveError, TaskweaveResult};
use taskweave_mcp::{extract_json, LlmBackend, ProviderContent, ProviderPart, ProviderRole};
use tracing::info;

/// One subtask produced by the decomposition model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskSpec {
    pub subtask_id: String,
    pub subtask_name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_group")]
    pub parallel_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_complexity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_group() -> String {
    "default".to_string()
}

impl SubtaskSpec {
    /// Text an agent is assigned and keyword-matched against: the name,
    /// extended by the long description when present.
    pub fn assignment_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{}: {}", self.subtask_name, description),
            None => self.subtask_name.clone(),
        }
    }
}

/// The validated DAG emitted by the decomposition model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decomposition {
    pub main_task: String,
    pub subtasks: Vec<SubtaskSpec>,
}

/// Wraps the decomposition LLM call and the tolerant parse/validate path.
pub struct Decomposer {
    backend: Arc<dyn LlmBackend>,
}

impl Decomposer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Ask the model to decompose a task and validate the result.
    pub async fn decompose(&self, description: &str) -> TaskweaveResult<Decomposition> {
        let prompt = format!(
            "Decompose the following task into subtasks.\n\
             Task: {description}\n\n\
             Respond with a JSON object of the form\n\
             {{\"mainTask\": \"...\", \"subtasks\": [{{\"subtaskId\": \"s1\", \
             \"subtaskName\": \"...\", \"dependencies\": [], \
             \"parallelGroup\": \"A\", \"estimatedComplexity\": 1-5, \
             \"description\": \"...\"}}]}}\n\
             Dependencies must reference subtaskIds and must not form cycles. \
             Subtasks sharing a parallelGroup may run concurrently."
        );

        let contents = vec![ProviderContent {
            role: ProviderRole::User,
            parts: vec![ProviderPart::Text { text: prompt }],
        }];
        let reply = self.backend.generate(&contents, &[]).await?;
        let text = reply.text.unwrap_or_default();

        let decomposition = parse_decomposition(&text, description)?;
        validate(&decomposition)?;
        info!(
            subtasks = decomposition.subtasks.len(),
            "Decomposition accepted"
        );
        Ok(decomposition)
    }
}

/// Parse the model's output into a [`Decomposition`].
///
/// Tolerates fenced code blocks, a missing `mainTask` (the original task
/// description is re-attached), and the root being the bare subtasks array.
pub fn parse_decomposition(
    text: &str,
    original_description: &str,
) -> TaskweaveResult<Decomposition> {
    let value = extract_json(text).ok_or_else(|| {
        TaskweaveError::Decomposition(format!("response is not JSON: {text}"))
    })?;

    let (main_task, subtasks_value) = if value.is_array() {
        (original_description.to_string(), value)
    } else {
        let main_task = value["mainTask"]
            .as_str()
            .unwrap_or(original_description)
            .to_string();
        let subtasks = value
            .get("subtasks")
            .cloned()
            .ok_or_else(|| TaskweaveError::Decomposition("missing subtasks".to_string()))?;
        (main_task, subtasks)
    };

    let subtasks: Vec<SubtaskSpec> = serde_json::from_value(subtasks_value)
        .map_err(|e| TaskweaveError::Decomposition(format!("malformed subtasks: {e}")))?;

    Ok(Decomposition {
        main_task,
        subtasks,
    })
}

/// Enforce the decomposition invariants: subtasks present, ids unique,
/// dependencies resolvable, graph acyclic.
pub fn validate(decomposition: &Decomposition) -> TaskweaveResult<()> {
    if decomposition.subtasks.is_empty() {
        return Err(TaskweaveError::Decomposition(
            "decomposition has no subtasks".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    for subtask in &decomposition.subtasks {
        if !ids.insert(subtask.subtask_id.as_str()) {
            return Err(TaskweaveError::Decomposition(format!(
                "duplicate subtask id: {}",
                subtask.subtask_id
            )));
        }
    }

    for subtask in &decomposition.subtasks {
        for dep in &subtask.dependencies {
            if !ids.contains(dep.as_str()) {
                return Err(TaskweaveError::Decomposition(format!(
                    "subtask {} depends on unknown id: {dep}",
                    subtask.subtask_id
                )));
            }
        }
    }

    if has_cycle(&decomposition.subtasks) {
        return Err(TaskweaveError::Decomposition(
            "dependency cycle detected".to_string(),
        ));
    }

    Ok(())
}

fn has_cycle(subtasks: &[SubtaskSpec]) -> bool {
    let deps: HashMap<&str, &Vec<String>> = subtasks
        .iter()
        .map(|s| (s.subtask_id.as_str(), &s.dependencies))
        .collect();

    // 1 = on the current path, 2 = fully explored
    let mut marks: HashMap<&str, u8> = HashMap::new();
    for id in deps.keys() {
        if dfs(id, &deps, &mut marks) {
            return true;
        }
    }
    false
}

fn dfs<'a>(
    id: &'a str,
    deps: &HashMap<&'a str, &'a Vec<String>>,
    marks: &mut HashMap<&'a str, u8>,
) -> bool {
    match marks.get(id) {
        Some(1) => return true,
        Some(2) => return false,
        _ => {}
    }
    marks.insert(id, 1);
    if let Some(children) = deps.get(id) {
        for child in children.iter() {
            if let Some((&key, _)) = deps.get_key_value(child.as_str()) {
                if dfs(key, deps, marks) {
                    return true;
                }
            }
        }
    }
    marks.insert(id, 2);
    false
}
