use std::future::Future;
use std::time::Duration;
use taskweave_core::{TaskweaveError, TaskweaveResult};
use tracing::warn;

/// Maximum LLM attempts per evaluation call.
pub const MAX_LLM_ATTEMPTS: u32 = 5;

/// Base delay for exponential backoff; doubles per attempt.
pub const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Marker carried by errors that exhausted the retry budget.
pub const MAX_RETRIES_MARKER: &str = "LLM_MAX_RETRIES_REACHED";

pub fn is_rate_limited(err: &TaskweaveError) -> bool {
    err.llm_status() == Some(429)
}

/// Provider-suggested retry delay, if the 429 payload carries one.
/// The provider embeds `"retryDelay": "<n>s"` in its error details.
pub fn retry_hint(details: &str) -> Option<Duration> {
    let idx = details.find("retryDelay")?;
    let rest = &details[idx..];
    let colon = rest.find(':')?;
    let after = rest[colon + 1..].trim_start().strip_prefix('"')?;
    let end = after.find('"')?;
    let secs: f64 = after[..end].strip_suffix('s')?.parse().ok()?;
    Some(Duration::from_secs_f64(secs.max(0.0)))
}

/// Run an LLM call with the evaluator retry policy: up to
/// [`MAX_LLM_ATTEMPTS`] attempts, retrying only on rate limits, honoring
/// the provider's suggested delay when present and exponential backoff
/// otherwise. Non-rate-limit errors are terminal for the call.
pub async fn with_retry<F, Fut, T>(op_name: &str, mut op: F) -> TaskweaveResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TaskweaveResult<T>>,
{
    let mut backoff = BASE_BACKOFF;

    for attempt in 1..=MAX_LLM_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_rate_limited(&e) => {
                if attempt == MAX_LLM_ATTEMPTS {
                    return Err(TaskweaveError::Evaluation(format!(
                        "{MAX_RETRIES_MARKER}: {op_name}: {e}"
                    )));
                }
                let delay = match &e {
                    TaskweaveError::Llm { details, .. } => retry_hint(details),
                    _ => None,
                }
                .unwrap_or(backoff);
                warn!(
                    op = %op_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited; backing off"
                );
                tokio::time::sleep(delay).await;
                backoff *= 2;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("every attempt returns or retries")
}
