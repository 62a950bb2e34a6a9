//! Tool-specific error types.
//!
//! Three layers of failure meet here:
//! - [`ToolError`]: registry-level failures (bad definitions, duplicates, lookups)
//! - [`HandlerError`]: what a tool handler can fail with
//! - [`DispatchError`]: protocol faults the dispatcher cannot turn into a response

use serde_json::Value;
use thiserror::Error;

use crate::domains::things::BackendError;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A definition was rejected at construction.
    #[error("Invalid tool definition: {0}")]
    InvalidDefinition(String),

    /// A tool with the same name is already registered.
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The tool's handler failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ToolError {
    /// Create a new "invalid definition" error.
    pub fn invalid_definition(msg: impl Into<String>) -> Self {
        Self::InvalidDefinition(msg.into())
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }
}

/// Failure reported by a tool handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A typed failure carrying a human-readable message.
    #[error("{message}")]
    Failed { message: String },

    /// The arguments did not match the tool's input schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// An arbitrary value raised in place of an error.
    #[error("{}", thrown_message(.0))]
    Thrown(Value),

    /// The result of a typed tool could not be serialized.
    ///
    /// Only [`ToolDefinition::new`](super::ToolDefinition::new) builds this;
    /// serde errors a handler raises itself convert to [`HandlerError::Failed`].
    #[error("Failed to serialize tool result: {0}")]
    Serialization(#[source] ResultEncodingError),
}

/// A typed tool's result that could not be encoded as JSON.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ResultEncodingError(serde_json::Error);

impl ResultEncodingError {
    pub(crate) fn into_inner(self) -> serde_json::Error {
        self.0
    }
}

impl HandlerError {
    /// Create a new typed failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Wrap an arbitrary value as a failure.
    pub fn thrown(value: impl Into<Value>) -> Self {
        Self::Thrown(value.into())
    }

    pub(crate) fn serialization(source: serde_json::Error) -> Self {
        Self::Serialization(ResultEncodingError(source))
    }

    /// The message reported to the caller.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// String form of a thrown value: its `message` field when it has one,
/// the raw text for strings, the JSON text otherwise.
fn thrown_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::failed(err.to_string())
    }
}

impl From<BackendError> for HandlerError {
    fn from(err: BackendError) -> Self {
        Self::failed(err.to_string())
    }
}

/// Protocol faults raised by the dispatcher.
///
/// These never become a tool response; transports surface them as
/// JSON-RPC errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The requested tool name does not resolve.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The request itself is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A handler returned a value that cannot be serialized.
    #[error("Failed to serialize response for tool {tool}: {source}")]
    Serialization {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DispatchError {
    /// Create a new "invalid request" error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// JSON-RPC error code for this fault.
    pub fn code(&self) -> i32 {
        match self {
            Self::UnknownTool(_) | Self::InvalidRequest(_) => -32602,
            Self::Serialization { .. } => -32603,
        }
    }
}
