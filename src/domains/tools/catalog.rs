//! Tool catalog - builds the registry with every tool the server exposes.
//!
//! Adding a tool means writing its file under `definitions/` and adding one
//! `register_tool` line here.

use std::sync::Arc;

use crate::domains::things::TaskBackend;

use super::definitions::{ProjectsListTool, TodosCompleteTool, TodosCreateTool, TodosListTool};
use super::error::ToolError;
use super::registry::ToolRegistry;

/// Build the registry with all tools bound to `backend`.
pub fn build_tool_registry(backend: Arc<dyn TaskBackend>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register_tool(TodosListTool::definition(backend.clone())?)?;
    registry.register_tool(TodosCreateTool::definition(backend.clone())?)?;
    registry.register_tool(TodosCompleteTool::definition(backend.clone())?)?;
    registry.register_tool(ProjectsListTool::definition(backend)?)?;
    Ok(registry)
}
