use crate::retry::with_retry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskweave_core::{AgentReport, TaskweaveError, TaskweaveResult};
use taskweave_mcp::{extract_json, LlmBackend, ProviderContent, ProviderPart, ProviderRole};
use tracing::warn;

/// One scored dimension with its justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub rating: u8,
    pub reason: String,
}

impl MetricScore {
    pub fn new(rating: u8, reason: impl Into<String>) -> Self {
        Self {
            rating: rating.clamp(1, 10),
            reason: reason.into(),
        }
    }
}

/// Per-agent evaluation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvaluation {
    pub accuracy: MetricScore,
    pub completeness: MetricScore,
    pub coherence: MetricScore,
    pub efficiency: MetricScore,
    pub overall: f64,
    pub feedback: String,
}

impl AgentEvaluation {
    fn with_scores(
        accuracy: MetricScore,
        completeness: MetricScore,
        coherence: MetricScore,
        efficiency: MetricScore,
        feedback: String,
    ) -> Self {
        let overall = f64::from(
            u32::from(accuracy.rating)
                + u32::from(completeness.rating)
                + u32::from(coherence.rating)
                + u32::from(efficiency.rating),
        ) / 4.0;
        Self {
            accuracy,
            completeness,
            coherence,
            efficiency,
            overall,
            feedback,
        }
    }
}

/// Deterministic efficiency score from wall-clock execution time.
pub fn efficiency_score(execution_time_ms: u64) -> MetricScore {
    let (rating, reason) = if execution_time_ms < 1_000 {
        (9, "completed in under a second")
    } else if execution_time_ms < 5_000 {
        (7, "completed in under five seconds")
    } else {
        (4, "took five seconds or longer")
    };
    MetricScore::new(rating, format!("{reason} ({execution_time_ms} ms)"))
}

/// Scores agent reports with one LLM prompt per report plus a freeform
/// feedback prompt.
pub struct AgentEvaluator {
    backend: Arc<dyn LlmBackend>,
}

fn one_shot_prompt(text: String) -> Vec<ProviderContent> {
    vec![ProviderContent {
        role: ProviderRole::User,
        parts: vec![ProviderPart::Text { text }],
    }]
}

impl AgentEvaluator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Evaluate one report in the context of the parent task.
    ///
    /// Errored agents get minimum scores without an LLM round-trip. Scoring
    /// goes through the rate-limit retry policy; unparseable responses and
    /// retry exhaustion degrade to an `evaluation_llm_error` record rather
    /// than failing the pipeline.
    pub async fn evaluate(&self, report: &AgentReport, task_context: &str) -> AgentEvaluation {
        if report.is_error() {
            let reason = "Agent ended in error; minimum score.";
            return AgentEvaluation::with_scores(
                MetricScore::new(1, reason),
                MetricScore::new(1, reason),
                MetricScore::new(1, reason),
                MetricScore::new(1, reason),
                format!(
                    "The agent failed before producing a usable result: {}",
                    report.result
                ),
            );
        }

        let efficiency = efficiency_score(report.stats.execution_time_ms);

        let (accuracy, completeness, coherence) = match self.score(report, task_context).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(agent_id = %report.agent_id, error = %e, "Score generation failed");
                let reason = format!("evaluation_llm_error: {e}");
                (
                    MetricScore::new(1, reason.clone()),
                    MetricScore::new(1, reason.clone()),
                    MetricScore::new(1, reason),
                )
            }
        };

        let feedback = self.feedback(report, task_context).await;

        AgentEvaluation::with_scores(accuracy, completeness, coherence, efficiency, feedback)
    }

    async fn score(
        &self,
        report: &AgentReport,
        task_context: &str,
    ) -> TaskweaveResult<(MetricScore, MetricScore, MetricScore)> {
        let prompt = format!(
            "Evaluate this agent execution.\n\
             Parent task: {task_context}\n\
             Subtask: {}\n\
             Result: {}\n\
             Reasoning: {}\n\n\
             Respond with a JSON object of the form\n\
             {{\"accuracy\": {{\"rating\": <1-10>, \"reason\": \"...\"}},\n \
               \"completeness\": {{\"rating\": <1-10>, \"reason\": \"...\"}},\n \
               \"coherence\": {{\"rating\": <1-10>, \"reason\": \"...\"}}}}",
            report.task_assigned, report.result, report.reasoning,
        );

        let backend = self.backend.clone();
        let reply = with_retry("agent_score", move || {
            let backend = backend.clone();
            let prompt = prompt.clone();
            async move {
                let contents = one_shot_prompt(prompt);
                backend.generate(&contents, &[]).await
            }
        })
        .await?;

        let text = reply.text.unwrap_or_default();
        let value = extract_json(&text).ok_or_else(|| {
            TaskweaveError::Evaluation(format!("unparseable score response: {text}"))
        })?;

        Ok((
            parse_metric(&value, "accuracy")?,
            parse_metric(&value, "completeness")?,
            parse_metric(&value, "coherence")?,
        ))
    }

    /// Freeform feedback. Single attempt: a lost feedback string degrades
    /// gracefully, a lost score does not.
    async fn feedback(&self, report: &AgentReport, task_context: &str) -> String {
        let prompt = format!(
            "In two or three sentences, give constructive feedback on this \
             agent execution.\nParent task: {task_context}\nSubtask: {}\nResult: {}",
            report.task_assigned, report.result,
        );
        match self.backend.generate(&one_shot_prompt(prompt), &[]).await {
            Ok(reply) => reply
                .text
                .unwrap_or_else(|| "No feedback produced.".to_string()),
            Err(e) => {
                warn!(agent_id = %report.agent_id, error = %e, "Feedback generation failed");
                format!("Feedback unavailable: {e}")
            }
        }
    }
}

fn parse_metric(value: &serde_json::Value, key: &str) -> TaskweaveResult<MetricScore> {
    let entry = value.get(key).ok_or_else(|| {
        TaskweaveError::Evaluation(format!("score response missing '{key}'"))
    })?;
    let rating = entry["rating"].as_u64().ok_or_else(|| {
        TaskweaveError::Evaluation(format!("'{key}' has no integer rating"))
    })? as u8;
    let reason = entry["reason"].as_str().unwrap_or("").to_string();
    Ok(MetricScore::new(rating, reason))
}
