//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `definition.rs` - The tool descriptor (name, description, schema, handler)
//! - `registry.rs` - Name → definition mapping, fixed once the server starts
//! - `dispatcher.rs` - Discovery and call routing, response envelope
//! - `catalog.rs` - Registers every tool under `definitions/`
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `error.rs` - Registry, handler and dispatch error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `todos/move.rs`)
//! 2. Define params, `execute()` and `definition()`
//! 3. Export it in `definitions/mod.rs`
//! 4. Register it in `catalog.rs`

pub mod catalog;
pub mod definition;
pub mod definitions;
pub mod dispatcher;
mod error;
pub mod registry;

pub use catalog::build_tool_registry;
pub use definition::{ToolDefinition, ToolDescriptor, ToolFuture, ToolHandler};
pub use dispatcher::{CallOutcome, ContentBlock, Dispatcher, ResponseOrdering, ToolResponse};
pub use error::{DispatchError, HandlerError, ResultEncodingError, ToolError};
pub use registry::ToolRegistry;
