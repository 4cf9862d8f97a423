//! SQLite-backed task store.
//!
//! Uses `rusqlite` behind a `tokio::sync::Mutex`; task volume is a single
//! user's list, so one connection is plenty. Timestamps are stored as
//! fixed-width RFC 3339 text (millisecond precision, `Z` suffix), which
//! keeps lexicographic order equal to chronological order for the range
//! and sort queries below.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{StoreError, TaskStore};
use crate::domain::{CreateTaskInput, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTaskInput};

const MAX_TITLE_CHARS: usize = 500;
const MAX_DESCRIPTION_CHARS: usize = 2000;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    status      TEXT NOT NULL,
    priority    TEXT NOT NULL,
    due_date    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);
CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);";

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, status, priority, due_date, created_at, updated_at FROM tasks";

// rowid breaks created_at ties so listing order stays deterministic
const NEWEST_FIRST: &str = " ORDER BY created_at DESC, rowid DESC";

pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn =
            Connection::open(path.as_ref()).context("Failed to open SQLite task database")?;

        conn.execute_batch(&format!("PRAGMA journal_mode=WAL;\n{SCHEMA}"))
            .context("Failed to initialize tasks schema")?;

        info!("Task store opened at {:?}", path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create(&self, input: CreateTaskInput) -> Result<Task, StoreError> {
        let title = validate_title(&input.title, "Task title is required")?;
        let description = clean_description(input.description)?;
        let now = Utc::now();

        let task = Task {
            id: Uuid::new_v4(),
            title,
            description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.id.to_string(),
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date.as_ref().map(fmt_ts),
                fmt_ts(&task.created_at),
                fmt_ts(&task.updated_at),
            ],
        )?;

        debug!(task_id = %task.id, "Created task");
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let conn = self.conn.lock().await;
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id.to_string()], row_to_task)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let mut sql = format!("{SELECT_COLUMNS} WHERE 1=1");
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(status.as_str().to_string());
        }
        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            values.push(priority.as_str().to_string());
        }
        if let Some(from) = &filter.due_date_from {
            sql.push_str(" AND due_date >= ?");
            values.push(fmt_ts(from));
        }
        if let Some(to) = &filter.due_date_to {
            sql.push_str(" AND due_date <= ?");
            values.push(fmt_ts(to));
        }
        sql.push_str(NEWEST_FIRST);

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    async fn update(&self, id: Uuid, input: UpdateTaskInput) -> Result<Task, StoreError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Option<String>> = Vec::new();

        if let Some(title) = &input.title {
            sets.push("title = ?");
            values.push(Some(validate_title(title, "Task title cannot be empty")?));
        }
        if let Some(description) = &input.description {
            sets.push("description = ?");
            values.push(clean_description(description.clone())?);
        }
        if let Some(status) = input.status {
            sets.push("status = ?");
            values.push(Some(status.as_str().to_string()));
        }
        if let Some(priority) = input.priority {
            sets.push("priority = ?");
            values.push(Some(priority.as_str().to_string()));
        }
        if let Some(due_date) = &input.due_date {
            sets.push("due_date = ?");
            values.push(due_date.as_ref().map(fmt_ts));
        }

        sets.push("updated_at = ?");
        values.push(Some(fmt_ts(&Utc::now())));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));

        let conn = self.conn.lock().await;
        let mut params_vec: Vec<Option<String>> = values;
        params_vec.push(Some(id.to_string()));

        let changed = conn.execute(&sql, rusqlite::params_from_iter(params_vec))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        let select = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let mut stmt = conn.prepare(&select)?;
        let task = stmt.query_row(params![id.to_string()], row_to_task)?;

        debug!(task_id = %id, "Updated task");
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!(task_id = %id, "Deleted task");
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        let pattern = like_pattern(query);
        let sql = format!(
            "{SELECT_COLUMNS} WHERE lower(title) LIKE lower(?1) ESCAPE '\\' \
             OR lower(description) LIKE lower(?1) ESCAPE '\\'{NEWEST_FIRST}"
        );

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern], row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}

// create and update report a missing title differently
fn validate_title(title: &str, empty_msg: &str) -> Result<String, StoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(empty_msg.to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(StoreError::InvalidInput(
            "Task title must be less than 500 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trims a description; blank collapses to NULL.
fn clean_description(description: Option<String>) -> Result<Option<String>, StoreError> {
    let Some(description) = description else {
        return Ok(None);
    };
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(StoreError::InvalidInput(
            "Task description must be less than 2000 characters".to_string(),
        ));
    }
    let trimmed = description.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Fixed-width storage format for timestamps.
fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `%` and `_` in user queries are literals, not wildcards.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let due_date: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Task {
        id: Uuid::parse_str(&id).map_err(|e| conversion_err(0, e.to_string()))?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: TaskStatus::from_wire(&status)
            .ok_or_else(|| conversion_err(3, format!("unknown status: {status}")))?,
        priority: TaskPriority::from_wire(&priority)
            .ok_or_else(|| conversion_err(4, format!("unknown priority: {priority}")))?,
        due_date: due_date
            .map(|d| parse_ts(&d).ok_or_else(|| conversion_err(5, format!("bad timestamp: {d}"))))
            .transpose()?,
        created_at: parse_ts(&created_at)
            .ok_or_else(|| conversion_err(6, format!("bad timestamp: {created_at}")))?,
        updated_at: parse_ts(&updated_at)
            .ok_or_else(|| conversion_err(7, format!("bad timestamp: {updated_at}")))?,
    })
}

fn parse_ts(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn conversion_err(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteTaskStore {
        SqliteTaskStore::in_memory().unwrap()
    }

    fn new_task(title: &str) -> CreateTaskInput {
        CreateTaskInput {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults_and_trims() {
        let store = store();
        let task = store
            .create(CreateTaskInput {
                title: "  Buy milk  ".to_string(),
                description: Some("   ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(task.title, "Buy milk");
        assert!(task.description.is_none());
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);

        let fetched = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Buy milk");
        assert_eq!(fetched.created_at, task.created_at);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_titles() {
        let store = store();
        assert!(matches!(
            store.create(new_task("   ")).await,
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.create(new_task(&"x".repeat(501))).await,
            Err(StoreError::InvalidInput(_))
        ));
        assert!(store.create(new_task(&"x".repeat(500))).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = store();
        let a = store.create(new_task("first")).await.unwrap();
        let b = store.create(new_task("second")).await.unwrap();
        let c = store.create(new_task("third")).await.unwrap();

        let tasks = store.list(&TaskFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_priority() {
        let store = store();
        store
            .create(CreateTaskInput {
                title: "urgent todo".to_string(),
                priority: Some(TaskPriority::Urgent),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .create(CreateTaskInput {
                title: "done".to_string(),
                status: Some(TaskStatus::Done),
                ..Default::default()
            })
            .await
            .unwrap();

        let filter = TaskFilter {
            status: Some(TaskStatus::Todo),
            ..Default::default()
        };
        let tasks = store.list(&filter).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "urgent todo");

        let filter = TaskFilter {
            priority: Some(TaskPriority::Urgent),
            ..Default::default()
        };
        let tasks = store.list(&filter).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "urgent todo");
    }

    #[tokio::test]
    async fn test_list_filters_by_due_date_range() {
        let store = store();
        let due = |s: &str| {
            Some(
                DateTime::parse_from_rfc3339(s)
                    .unwrap()
                    .with_timezone(&Utc),
            )
        };

        store
            .create(CreateTaskInput {
                title: "june".to_string(),
                due_date: due("2024-06-15T18:00:00Z"),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .create(CreateTaskInput {
                title: "july".to_string(),
                due_date: due("2024-07-15T18:00:00Z"),
                ..Default::default()
            })
            .await
            .unwrap();
        store.create(new_task("undated")).await.unwrap();

        let filter = TaskFilter {
            due_date_from: due("2024-06-01T00:00:00Z"),
            due_date_to: due("2024-06-30T23:59:59Z"),
            ..Default::default()
        };
        let tasks = store.list(&filter).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "june");
    }

    #[tokio::test]
    async fn test_update_changes_only_present_fields() {
        let store = store();
        let task = store
            .create(CreateTaskInput {
                title: "original".to_string(),
                description: Some("context".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = store
            .update(
                task.id,
                UpdateTaskInput {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "original");
        assert_eq!(updated.description.as_deref(), Some("context"));
        assert_eq!(updated.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_update_clears_description_on_explicit_null() {
        let store = store();
        let task = store
            .create(CreateTaskInput {
                title: "t".to_string(),
                description: Some("context".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = store
            .update(
                task.id,
                UpdateTaskInput {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.description.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_task_is_not_found() {
        let store = store();
        let err = store
            .update(Uuid::new_v4(), UpdateTaskInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_task() {
        let store = store();
        let task = store.create(new_task("gone soon")).await.unwrap();

        store.delete(task.id).await.unwrap();
        assert!(store.get(task.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(task.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_matches_title_and_description_case_insensitively() {
        let store = store();
        store.create(new_task("Review budget")).await.unwrap();
        store
            .create(CreateTaskInput {
                title: "Call vendor".to_string(),
                description: Some("about the BUDGET overrun".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store.create(new_task("Unrelated")).await.unwrap();

        let tasks = store.search("budget").await.unwrap();
        assert_eq!(tasks.len(), 2);

        let tasks = store.search("BUDGET").await.unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_as_literals() {
        let store = store();
        store.create(new_task("100% done")).await.unwrap();
        store.create(new_task("100 pct done")).await.unwrap();

        let tasks = store.search("100%").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "100% done");
    }

    #[tokio::test]
    async fn test_due_date_round_trips() {
        let store = store();
        let due = DateTime::parse_from_rfc3339("2024-06-02T18:00:00.000Z")
            .unwrap()
            .with_timezone(&Utc);

        let task = store
            .create(CreateTaskInput {
                title: "dated".to_string(),
                due_date: Some(due),
                ..Default::default()
            })
            .await
            .unwrap();

        let fetched = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.due_date, Some(due));
    }
}
