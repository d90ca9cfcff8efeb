use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskweave_core::{AgentReport, AgentStatus};

/// One agent state change.
///
/// Terminal events carry the full report; non-terminal events carry status
/// and timestamp only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub agent_id: String,
    pub status: AgentStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AgentReport>,
}

impl AgentEvent {
    pub fn status_change(agent_id: impl Into<String>, status: AgentStatus) -> Self {
        Self {
            agent_id: agent_id.into(),
            status,
            timestamp: Utc::now(),
            report: None,
        }
    }

    pub fn terminal(report: AgentReport) -> Self {
        Self {
            agent_id: report.agent_id.clone(),
            status: report.status,
            timestamp: Utc::now(),
            report: Some(report),
        }
    }
}

/// Callback invoked for every agent state change.
pub type EventCallback = Arc<dyn Fn(AgentEvent) + Send + Sync>;

/// A callback that discards all events.
pub fn null_callback() -> EventCallback {
    Arc::new(|_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_event_carries_report() {
        let report = AgentReport::synthesized_error(
            "s1",
            "task",
            "general",
            AgentStatus::Error,
            "failed",
        );
        let event = AgentEvent::terminal(report);
        assert_eq!(event.agent_id, "s1");
        assert_eq!(event.status, AgentStatus::Error);
        assert!(event.report.is_some());
    }

    #[test]
    fn test_status_event_serialization_omits_report() {
        let event = AgentEvent::status_change("s1", AgentStatus::InProgress);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert!(json.get("report").is_none());
    }
}
