//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod projects;
pub mod todos;

pub use projects::ProjectsListTool;
pub use todos::{TodosCompleteTool, TodosCreateTool, TodosListTool};
