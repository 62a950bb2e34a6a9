//! Things domain module.
//!
//! This module holds the task-management backend that the tools drive.
//! The tools only see the [`TaskBackend`] trait; the concrete backend is
//! picked from configuration at server construction.
//!
//! ## Backends
//!
//! - `memory.rs` - process-local store, used off macOS and in tests
//! - `applescript.rs` - drives the Things3 app through `osascript`

mod applescript;
mod backend;
mod memory;
mod model;

pub use applescript::ThingsScriptBackend;
pub use backend::{BackendError, BackendResult, TaskBackend};
pub use memory::InMemoryBackend;
pub use model::{NewTodo, Project, Todo, TodoFilter, TodoStatus};

use std::sync::Arc;

use crate::core::config::{BackendConfig, BackendKind};

/// Build the backend selected by the configuration.
pub fn build_backend(config: &BackendConfig) -> Arc<dyn TaskBackend> {
    match config.kind {
        BackendKind::Memory => Arc::new(InMemoryBackend::new()),
        BackendKind::Things => Arc::new(ThingsScriptBackend::new(config.osascript_path.clone())),
    }
}
