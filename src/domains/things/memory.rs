//! In-memory task backend.
//!
//! Keeps to-dos in process memory only. Used when Things3 is not available
//! (any platform other than macOS) and as the backend for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{BackendError, BackendResult, TaskBackend};
use super::model::{NewTodo, Project, Todo, TodoFilter, TodoStatus};

#[derive(Debug, Clone)]
struct StoredTodo {
    todo: Todo,
    list: TodoFilter,
}

#[derive(Debug, Default)]
struct Store {
    todos: Vec<StoredTodo>,
    next_id: u64,
}

/// Process-local task store.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: RwLock<Store>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_todos(&self, filter: TodoFilter, project: Option<&str>) -> BackendResult<Vec<Todo>> {
        let store = self.store.read().await;
        let todos = store
            .todos
            .iter()
            .filter(|stored| match filter {
                TodoFilter::Logbook => stored.todo.status != TodoStatus::Open,
                _ => stored.todo.status == TodoStatus::Open && stored.list == filter,
            })
            .filter(|stored| project.is_none_or(|p| stored.todo.project.as_deref() == Some(p)))
            .map(|stored| stored.todo.clone())
            .collect();
        Ok(todos)
    }

    async fn create_todo(&self, todo: NewTodo) -> BackendResult<Todo> {
        if todo.title.trim().is_empty() {
            return Err(BackendError::invalid_input("title cannot be empty"));
        }
        let list = todo.list.unwrap_or_default();
        if list == TodoFilter::Logbook {
            return Err(BackendError::invalid_input(
                "to-dos cannot be created directly in the Logbook",
            ));
        }

        let mut store = self.store.write().await;
        store.next_id += 1;
        let created = Todo {
            id: store.next_id.to_string(),
            title: todo.title,
            notes: todo.notes,
            status: TodoStatus::Open,
            project: todo.project,
            tags: todo.tags,
            created_at: Some(Utc::now()),
        };
        debug!("Stored to-do {} in {}", created.id, list.list_name());
        store.todos.push(StoredTodo {
            todo: created.clone(),
            list,
        });
        Ok(created)
    }

    async fn complete_todo(&self, id: &str) -> BackendResult<Todo> {
        let mut store = self.store.write().await;
        let stored = store
            .todos
            .iter_mut()
            .find(|stored| stored.todo.id == id)
            .ok_or_else(|| BackendError::not_found(format!("to-do {id}")))?;
        stored.todo.status = TodoStatus::Completed;
        Ok(stored.todo.clone())
    }

    async fn list_projects(&self) -> BackendResult<Vec<Project>> {
        let store = self.store.read().await;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for stored in &store.todos {
            if let Some(project) = stored.todo.project.as_deref() {
                let open = counts.entry(project).or_default();
                if stored.todo.status == TodoStatus::Open {
                    *open += 1;
                }
            }
        }
        Ok(counts
            .into_iter()
            .map(|(name, open_todos)| Project {
                name: name.to_string(),
                open_todos,
            })
            .collect())
    }
}
