//! Domain types for the voxtask tracker.
//!
//! This module contains the core data structures:
//! - Task: The persisted unit of work
//! - Draft: Unsaved output of the voice parsing pipeline

pub mod draft;
pub mod task;

// Re-export commonly used types
pub use draft::{RawTaskFields, TaskDraft};
pub use task::{CreateTaskInput, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTaskInput};
