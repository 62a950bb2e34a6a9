//! List to-dos tool definition.
//!
//! A tool that lists the to-dos of one Things3 list, optionally narrowed
//! to a project.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domains::things::{BackendResult, TaskBackend, Todo, TodoFilter};
use crate::domains::tools::definition::ToolDefinition;
use crate::domains::tools::error::{HandlerError, ToolError};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the list to-dos tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct TodosListParams {
    /// Which list to read (default: inbox).
    #[schemars(description = "List to read: inbox, today, upcoming, anytime, someday or logbook")]
    #[serde(default)]
    pub filter: TodoFilter,

    /// Only return to-dos of this project.
    #[schemars(description = "Optional project name to narrow the listing")]
    #[serde(default)]
    pub project: Option<String>,
}

/// Structured output of the list to-dos tool.
#[derive(Debug, Clone, Serialize)]
pub struct TodoListOutput {
    pub filter: TodoFilter,
    pub count: usize,
    pub items: Vec<Todo>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// List to-dos tool.
pub struct TodosListTool;

impl TodosListTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "todos_list";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "List to-dos from a Things3 list (inbox, today, upcoming, anytime, someday, logbook), optionally filtered by project.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(filter = ?params.filter))]
    pub async fn execute(params: TodosListParams, backend: &dyn TaskBackend) -> BackendResult<TodoListOutput> {
        info!("Listing to-dos via {}", backend.name());
        let items = backend
            .list_todos(params.filter, params.project.as_deref())
            .await?;
        Ok(TodoListOutput {
            filter: params.filter,
            count: items.len(),
            items,
        })
    }

    /// Build the registry definition bound to `backend`.
    pub fn definition(backend: Arc<dyn TaskBackend>) -> Result<ToolDefinition, ToolError> {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, move |params: TodosListParams| {
            let backend = backend.clone();
            async move {
                Self::execute(params, backend.as_ref())
                    .await
                    .map_err(HandlerError::from)
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
