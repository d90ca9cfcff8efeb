use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use taskweave_core::{Priority, TaskStatus};
use taskweave_supervisor::Supervisor;
use tracing::warn;
use uuid::Uuid;

/// Build the HTTP surface over a supervisor handle.
pub fn build(supervisor: Supervisor) -> Router {
    Router::new()
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/{id}", get(get_task).delete(delete_task))
        .route("/tasks/{id}/agents", get(get_task_agents))
        .route("/tasks/{id}/status", put(update_status))
        .route("/tasks/{id}/priority", put(update_priority))
        .route("/system/stats", get(system_stats))
        .route("/events", get(crate::sse::events_handler))
        .route("/health", get(health))
        .with_state(supervisor)
}

fn bad_request(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "task not found" })),
    )
}

fn parse_task_id(raw: &str) -> Result<Uuid, (StatusCode, Json<serde_json::Value>)> {
    raw.parse().map_err(|_| not_found())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "taskweave" }))
}

#[derive(Deserialize)]
struct CreateTaskRequest {
    description: Option<String>,
    priority: Option<String>,
    #[serde(rename = "dueDate")]
    due_date: Option<DateTime<Utc>>,
}

async fn create_task(
    State(supervisor): State<Supervisor>,
    Json(body): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    let Some(description) = body.description.filter(|d| !d.trim().is_empty()) else {
        return bad_request("description is required").into_response();
    };

    let priority = match body.priority.as_deref() {
        None => Priority::default(),
        Some(raw) => match raw.parse::<Priority>() {
            Ok(p) => p,
            Err(_) => return bad_request("priority must be low, medium or high").into_response(),
        },
    };

    match supervisor.submit(&description, priority, body.due_date).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => {
            warn!(error = %e, "Task submission rejected");
            bad_request(&e.to_string()).into_response()
        }
    }
}

async fn list_tasks(State(supervisor): State<Supervisor>) -> impl IntoResponse {
    Json(supervisor.list().await)
}

async fn get_task(
    State(supervisor): State<Supervisor>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let task_id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match supervisor.get(task_id).await {
        Some(task) => Json(task).into_response(),
        None => not_found().into_response(),
    }
}

async fn get_task_agents(
    State(supervisor): State<Supervisor>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let task_id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    if supervisor.get(task_id).await.is_none() {
        return not_found().into_response();
    }
    let statuses = supervisor.agent_statuses(task_id).await.unwrap_or_default();
    Json(statuses).into_response()
}

#[derive(Deserialize)]
struct UpdateStatusRequest {
    status: Option<String>,
}

async fn update_status(
    State(supervisor): State<Supervisor>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    let task_id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let status = match body.status.as_deref().map(str::parse::<TaskStatus>) {
        Some(Ok(status)) => status,
        _ => return bad_request("invalid task status").into_response(),
    };
    match supervisor.update_status(task_id, status).await {
        Some(task) => Json(task).into_response(),
        None => not_found().into_response(),
    }
}

#[derive(Deserialize)]
struct UpdatePriorityRequest {
    priority: Option<String>,
}

async fn update_priority(
    State(supervisor): State<Supervisor>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePriorityRequest>,
) -> impl IntoResponse {
    let task_id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let priority = match body.priority.as_deref().map(str::parse::<Priority>) {
        Some(Ok(priority)) => priority,
        _ => return bad_request("priority must be low, medium or high").into_response(),
    };
    match supervisor.update_priority(task_id, priority).await {
        Some(task) => Json(task).into_response(),
        None => not_found().into_response(),
    }
}

async fn delete_task(
    State(supervisor): State<Supervisor>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let task_id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    if supervisor.delete(task_id).await {
        Json(json!({ "message": format!("task {task_id} deleted") })).into_response()
    } else {
        not_found().into_response()
    }
}

async fn system_stats(State(supervisor): State<Supervisor>) -> impl IntoResponse {
    Json(supervisor.stats().await)
}
