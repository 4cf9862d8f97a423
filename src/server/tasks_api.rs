//! Task CRUD endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;
use crate::dates;
use crate::domain::{CreateTaskInput, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTaskInput};

const MAX_SEARCH_CHARS: usize = 500;

/// Query string for `GET /api/tasks`. Everything arrives as text and is
/// validated here so a bad filter produces a clear 400 instead of an
/// empty result set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date_from: Option<String>,
    #[serde(default)]
    pub due_date_to: Option<String>,
}

/// GET /api/tasks
///
/// A non-blank `search` takes precedence over the structured filters.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if search.chars().count() > MAX_SEARCH_CHARS {
            return Err(ApiError::bad_request(
                "Search query must be 500 characters or less",
            ));
        }
        let tasks = state.store.search(search).await?;
        return Ok(Json(tasks));
    }

    let filter = TaskFilter {
        status: parse_status_filter(query.status.as_deref())?,
        priority: parse_priority_filter(query.priority.as_deref())?,
        due_date_from: parse_date_param(query.due_date_from.as_deref(), "dueDateFrom")?,
        due_date_to: parse_date_param(query.due_date_to.as_deref(), "dueDateTo")?,
    };

    if let (Some(from), Some(to)) = (filter.due_date_from, filter.due_date_to) {
        if from > to {
            return Err(ApiError::bad_request(
                "dueDateFrom must be before or equal to dueDateTo",
            ));
        }
    }

    let tasks = state.store.list(&filter).await?;
    Ok(Json(tasks))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let input: CreateTaskInput = parse_body(body)?;

    if let Some(due) = &input.due_date {
        reject_past_due_date(due)?;
    }

    let task = state.store.create(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    match state.store.get(id).await? {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::not_found("Task not found")),
    }
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    let input: UpdateTaskInput = parse_body(body)?;

    if input.is_empty() {
        return Err(ApiError::bad_request(
            "At least one field must be provided for update",
        ));
    }
    if let Some(Some(due)) = &input.due_date {
        reject_past_due_date(due)?;
    }

    let task = state.store.update(id, input).await?;
    Ok(Json(task))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_task_id(&id)?;
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
}

// Anything that is not a UUID cannot name a stored task.
fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found("Task not found"))
}

/// Day-granularity submission guard. A due date earlier today is allowed;
/// one on a previous calendar day is rejected.
fn reject_past_due_date(due: &DateTime<Utc>) -> Result<(), ApiError> {
    if dates::timestamp_is_past(due) {
        return Err(ApiError::bad_request("Due date cannot be in the past"));
    }
    Ok(())
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<TaskStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => TaskStatus::from_wire(value).map(Some).ok_or_else(|| {
            ApiError::bad_request("Invalid status filter. Must be one of: TODO, IN_PROGRESS, DONE")
        }),
    }
}

fn parse_priority_filter(raw: Option<&str>) -> Result<Option<TaskPriority>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => TaskPriority::from_wire(value).map(Some).ok_or_else(|| {
            ApiError::bad_request(
                "Invalid priority filter. Must be one of: LOW, MEDIUM, HIGH, URGENT",
            )
        }),
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` (read as midnight
/// UTC, which is how the web client sends day-only bounds).
fn parse_date_param(raw: Option<&str>, name: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(Some(DateTime::from_naive_utc_and_offset(midnight, Utc)));
        }
    }

    Err(ApiError::bad_request(format!("Invalid {name} format")))
}
