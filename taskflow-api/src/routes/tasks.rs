/// Task endpoints
///
/// Every route here runs behind the session middleware and acts only on tasks
/// owned by the authenticated user. A task owned by someone else is reported
/// exactly like a missing one (404).
///
/// - `GET /tasks` - list, with optional `filter`, `search`, `sortBy`, `sortDirection`
/// - `POST /tasks` - create (201)
/// - `GET /tasks/summary` - sidebar counts, overdue tasks, due reminders
/// - `GET /tasks/:id` - fetch one
/// - `PATCH /tasks/:id` - partial update
/// - `DELETE /tasks/:id` - delete (204)
///
/// Payloads are validated before any store call, so an invalid request never
/// causes a partial write.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use taskflow_shared::{
    auth::AuthContext,
    models::task::{CreateTask, Task},
    query::{self, TaskCounts, TaskView, ViewParams},
    validation::{validate_create, validate_update},
};
use uuid::Uuid;

/// Response of `GET /tasks/summary`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub counts: TaskCounts,

    /// Incomplete tasks past their due date, soonest due first
    pub overdue: Vec<Task>,

    /// Incomplete tasks whose reminder time has passed
    pub reminders_due: Vec<Task>,
}

/// Unparseable ids cannot name an owned task
fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::task_not_found())
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    let Json(value) = body?;
    Ok(value)
}

/// Lists the caller's tasks through the query engine
///
/// # Errors
///
/// - `400 Bad Request`: unknown `filter`, `sortBy` or `sortDirection`
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    params: Result<Query<ViewParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(params) = params?;
    let view = TaskView::parse(&params)?;

    let tasks = state.storage.tasks.list(auth.user_id).await?;
    tracing::debug!(user_id = %auth.user_id, view = %view, total = tasks.len(), "Listing tasks");

    Ok(Json(query::apply(&tasks, &view)))
}

/// Creates a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: field-level validation errors in `details`
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let draft = validate_create(&json_body(body)?)?;

    let task = state
        .storage
        .tasks
        .create(CreateTask::from_draft(auth.user_id, draft))
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Fetches one owned task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;

    state
        .storage
        .tasks
        .get(id, auth.user_id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

/// Applies a partial update to an owned task
///
/// # Errors
///
/// - `400 Bad Request`: invalid payload (checked before the task is looked up)
/// - `404 Not Found`: no such owned task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let patch = validate_update(&json_body(body)?)?;

    state
        .storage
        .tasks
        .update(id, auth.user_id, &patch)
        .await?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

/// Deletes an owned task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_task_id(&id)?;

    if state.storage.tasks.delete(id, auth.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::task_not_found())
    }
}

/// Counts per sidebar filter plus the overdue and reminder selections
pub async fn task_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskSummary>> {
    let tasks = state.storage.tasks.list(auth.user_id).await?;
    let now = Utc::now();

    let mut overdue: Vec<Task> = tasks
        .iter()
        .filter(|task| query::is_overdue(task, now))
        .cloned()
        .collect();
    overdue.sort_by_key(|task| task.due_date);

    Ok(Json(TaskSummary {
        counts: TaskCounts::from_tasks(&tasks),
        overdue,
        reminders_due: query::due_reminders(&tasks, now),
    }))
}
