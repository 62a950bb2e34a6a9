//! Create to-do tool definition.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::things::{BackendResult, NewTodo, TaskBackend, Todo, TodoFilter};
use crate::domains::tools::definition::ToolDefinition;
use crate::domains::tools::error::{HandlerError, ToolError};

/// Parameters for the create to-do tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TodosCreateParams {
    /// Title of the new to-do.
    #[schemars(description = "Title of the to-do")]
    pub title: String,

    #[schemars(description = "Optional notes")]
    #[serde(default)]
    pub notes: Option<String>,

    #[schemars(description = "Target list: inbox, today, upcoming, anytime or someday (default: inbox)")]
    #[serde(default)]
    pub list: Option<TodoFilter>,

    #[schemars(description = "Optional project to file the to-do under")]
    #[serde(default)]
    pub project: Option<String>,

    #[schemars(description = "Tags to attach")]
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Create to-do tool.
pub struct TodosCreateTool;

impl TodosCreateTool {
    pub const NAME: &'static str = "todos_create";

    pub const DESCRIPTION: &'static str = "Create a new to-do in Things3 with optional notes, target list, project and tags. Returns the created to-do.";

    #[instrument(skip_all, fields(title = %params.title))]
    pub async fn execute(params: TodosCreateParams, backend: &dyn TaskBackend) -> BackendResult<Todo> {
        info!("Creating to-do via {}", backend.name());
        backend
            .create_todo(NewTodo {
                title: params.title,
                notes: params.notes,
                list: params.list,
                project: params.project,
                tags: params.tags,
            })
            .await
    }

    pub fn definition(backend: Arc<dyn TaskBackend>) -> Result<ToolDefinition, ToolError> {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, move |params: TodosCreateParams| {
            let backend = backend.clone();
            async move {
                Self::execute(params, backend.as_ref())
                    .await
                    .map_err(HandlerError::from)
            }
        })
    }
}
