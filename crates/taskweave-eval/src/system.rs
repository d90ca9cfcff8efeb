use crate::evaluator::AgentEvaluation;
use crate::retry::with_retry;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use taskweave_core::TaskweaveResult;
use taskweave_mcp::{extract_json, LlmBackend, ProviderContent, ProviderPart, ProviderRole};
use taskweave_vector::{Collection, VectorGateway};
use tracing::warn;
use uuid::Uuid;

/// Aggregate evaluation of one task run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvaluation {
    pub system_rating: u8,
    pub analysis: String,
    pub recommendations: String,
    pub average_agent_score: f64,
}

/// Produces the run-level evaluation and persists it to the knowledge base.
pub struct SystemEvaluator {
    backend: Arc<dyn LlmBackend>,
    vectors: Arc<VectorGateway>,
}

impl SystemEvaluator {
    pub fn new(backend: Arc<dyn LlmBackend>, vectors: Arc<VectorGateway>) -> Self {
        Self { backend, vectors }
    }

    /// Evaluate the whole run. LLM problems degrade to a minimum rating
    /// rather than failing the pipeline; the record is persisted either way.
    pub async fn evaluate(
        &self,
        task_id: Uuid,
        task_description: &str,
        evaluations: &HashMap<String, AgentEvaluation>,
    ) -> SystemEvaluation {
        let average_agent_score = if evaluations.is_empty() {
            0.0
        } else {
            evaluations.values().map(|e| e.overall).sum::<f64>() / evaluations.len() as f64
        };

        let evaluation = match self
            .generate(task_description, average_agent_score, evaluations)
            .await
        {
            Ok((system_rating, analysis, recommendations)) => SystemEvaluation {
                system_rating,
                analysis,
                recommendations,
                average_agent_score,
            },
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "System evaluation LLM call failed");
                SystemEvaluation {
                    system_rating: 1,
                    analysis: format!("evaluation_llm_error: {e}"),
                    recommendations: String::new(),
                    average_agent_score,
                }
            }
        };

        let document = json!({
            "task_id": task_id,
            "task": task_description,
            "system_rating": evaluation.system_rating,
            "analysis": evaluation.analysis,
            "recommendations": evaluation.recommendations,
            "average_agent_score": evaluation.average_agent_score,
        })
        .to_string();
        self.vectors
            .store_best_effort(
                Collection::KnowledgeBase,
                task_id.to_string(),
                document,
                [("task_id".to_string(), json!(task_id.to_string()))].into(),
            )
            .await;

        evaluation
    }

    async fn generate(
        &self,
        task_description: &str,
        average: f64,
        evaluations: &HashMap<String, AgentEvaluation>,
    ) -> TaskweaveResult<(u8, String, String)> {
        let summaries: Vec<String> = evaluations
            .iter()
            .map(|(id, e)| format!("- {id}: overall {:.1} ({})", e.overall, e.feedback))
            .collect();
        let prompt = format!(
            "Evaluate this multi-agent run as a whole.\n\
             Task: {task_description}\n\
             Average agent score: {average:.2}\n\
             Per-agent evaluations:\n{}\n\n\
             Respond with a JSON object of the form\n\
             {{\"systemRating\": <1-10>, \"analysis\": \"...\", \"recommendations\": \"...\"}}",
            summaries.join("\n"),
        );

        let backend = self.backend.clone();
        let reply = with_retry("system_score", move || {
            let backend = backend.clone();
            let prompt = prompt.clone();
            async move {
                let contents = vec![ProviderContent {
                    role: ProviderRole::User,
                    parts: vec![ProviderPart::Text { text: prompt }],
                }];
                backend.generate(&contents, &[]).await
            }
        })
        .await?;

        let text = reply.text.unwrap_or_default();
        let value = extract_json(&text).ok_or_else(|| {
            taskweave_core::TaskweaveError::Evaluation(format!(
                "unparseable system evaluation: {text}"
            ))
        })?;

        let rating = value["systemRating"]
            .as_u64()
            .or_else(|| value["system_rating"].as_u64())
            .unwrap_or(1)
            .clamp(1, 10) as u8;
        let analysis = value["analysis"].as_str().unwrap_or("").to_string();
        let recommendations = value["recommendations"].as_str().unwrap_or("").to_string();
        Ok((rating, analysis, recommendations))
    }
}
