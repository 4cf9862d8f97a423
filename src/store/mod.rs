//! Task persistence.
//!
//! The [`TaskStore`] trait is the seam between the HTTP layer and storage;
//! handlers never see SQL. The shipped implementation is SQLite.

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

// Re-export the shipped backend
pub use sqlite::SqliteTaskStore;

use crate::domain::{CreateTaskInput, Task, TaskFilter, UpdateTaskInput};

/// Errors from task persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    /// Input rejected before touching the database (user-facing message)
    #[error("{0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Trait for task storage backends
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task and return it with generated fields filled in
    async fn create(&self, input: CreateTaskInput) -> Result<Task, StoreError>;

    /// Fetch one task by id
    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// List tasks matching the filter, newest first
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    /// Apply a partial update and return the updated task
    async fn update(&self, id: Uuid, input: UpdateTaskInput) -> Result<Task, StoreError>;

    /// Delete one task by id
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Case-insensitive substring search over title and description
    async fn search(&self, query: &str) -> Result<Vec<Task>, StoreError>;
}
