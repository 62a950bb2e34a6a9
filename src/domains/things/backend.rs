//! The backend trait and its error type.

use async_trait::async_trait;
use thiserror::Error;

use super::model::{NewTodo, Project, Todo, TodoFilter};

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised by a task backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The Things3 application is not running.
    #[error("Things3 is not running")]
    NotRunning,

    /// The referenced to-do or project does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was rejected before reaching the application.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The automation script failed.
    #[error("Script error: {0}")]
    Script(String),

    /// Spawning the automation process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Create a new "not found" error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a new "invalid input" error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new "script" error.
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }
}

/// Operations the tools need from a task-management application.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// List to-dos in a built-in list, optionally narrowed to one project.
    async fn list_todos(&self, filter: TodoFilter, project: Option<&str>) -> BackendResult<Vec<Todo>>;

    /// Create a to-do and return it as stored.
    async fn create_todo(&self, todo: NewTodo) -> BackendResult<Todo>;

    /// Mark a to-do as completed and return it.
    async fn complete_todo(&self, id: &str) -> BackendResult<Todo>;

    /// List projects with their open to-do counts.
    async fn list_projects(&self) -> BackendResult<Vec<Project>>;
}
