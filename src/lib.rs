//! Things MCP Server Library
//!
//! This crate exposes Things3 task management as Model Context Protocol (MCP)
//! tools. The interesting part is the tool layer: a fixed registry of tool
//! definitions and a dispatcher that turns every call into either a tool
//! response or a protocol fault.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the server and its transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Tool definitions, registry, dispatcher and the tool catalog
//!   - **things**: The task backend the tools drive
//!
//! # Example
//!
//! ```rust,no_run
//! use things_mcp_server::{Config, McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = McpServer::new(Config::from_env())?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
