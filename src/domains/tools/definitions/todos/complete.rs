//! Complete to-do tool definition.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::things::{BackendError, BackendResult, TaskBackend, Todo};
use crate::domains::tools::definition::ToolDefinition;
use crate::domains::tools::error::{HandlerError, ToolError};

/// Parameters for the complete to-do tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TodosCompleteParams {
    #[schemars(description = "Identifier of the to-do, as returned by todos_list")]
    pub id: String,
}

/// Complete to-do tool.
pub struct TodosCompleteTool;

impl TodosCompleteTool {
    pub const NAME: &'static str = "todos_complete";

    pub const DESCRIPTION: &'static str = "Mark a Things3 to-do as completed by its identifier.";

    #[instrument(skip_all, fields(id = %params.id))]
    pub async fn execute(params: TodosCompleteParams, backend: &dyn TaskBackend) -> BackendResult<Todo> {
        if params.id.trim().is_empty() {
            return Err(BackendError::invalid_input("id cannot be empty"));
        }
        info!("Completing to-do {}", params.id);
        backend.complete_todo(&params.id).await
    }

    pub fn definition(backend: Arc<dyn TaskBackend>) -> Result<ToolDefinition, ToolError> {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, move |params: TodosCompleteParams| {
            let backend = backend.clone();
            async move {
                Self::execute(params, backend.as_ref())
                    .await
                    .map_err(HandlerError::from)
            }
        })
    }
}
