//! Tool Registry - the name → definition mapping.
//!
//! The registry is filled once while the server is composed and then moved
//! behind an `Arc` in the dispatcher. Registration needs `&mut self`, so the
//! set of tools cannot change once the server is running and lookups need no
//! locking.

use std::collections::HashMap;

use rmcp::model::JsonObject;
use serde_json::Value;
use tracing::debug;

use super::definition::{ToolDefinition, ToolHandler};
use super::error::ToolError;

/// Registry of all available tools, in registration order.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool definition.
    ///
    /// Names are unique: a second definition with an existing name is
    /// rejected with [`ToolError::DuplicateTool`] and the first one stays.
    pub fn register_tool(&mut self, definition: ToolDefinition) -> Result<(), ToolError> {
        let name = definition.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }

        debug!("Registering tool: {}", name);
        self.index.insert(name, self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    /// All registered definitions, in registration order.
    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.definitions[i])
    }

    /// Look up the handler of a tool. `None` when the name is not registered.
    pub fn get_handler(&self, name: &str) -> Option<&ToolHandler> {
        self.get(name).map(ToolDefinition::handler)
    }

    /// Run the handler registered under `name`.
    ///
    /// Handler failures are propagated as [`ToolError::Handler`] without
    /// conversion.
    pub async fn execute_tool(&self, name: &str, arguments: JsonObject) -> Result<Value, ToolError> {
        let handler = self
            .get_handler(name)
            .ok_or_else(|| ToolError::not_found(name))?;
        Ok(handler.call(arguments).await?)
    }

    /// Number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.definitions.len()
    }

    /// Registered tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.definitions.iter().map(ToolDefinition::name).collect()
    }
}
