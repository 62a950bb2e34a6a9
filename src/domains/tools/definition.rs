//! Tool definitions - the immutable descriptor of one tool.
//!
//! A [`ToolDefinition`] bundles the name, description, input schema and
//! handler of a tool. Tool variety lives in the handler closure, not in a
//! type hierarchy: every tool is the same record.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::error::{HandlerError, ToolError};

/// Future produced by a tool handler.
pub type ToolFuture = BoxFuture<'static, Result<Value, HandlerError>>;

/// Shared handle to a tool's async capability.
#[derive(Clone)]
pub struct ToolHandler(Arc<dyn Fn(JsonObject) -> ToolFuture + Send + Sync>);

impl ToolHandler {
    /// Wrap a raw handler function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(JsonObject) -> ToolFuture + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the handler with a raw argument bag.
    pub fn call(&self, arguments: JsonObject) -> ToolFuture {
        (self.0)(arguments)
    }
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ToolHandler")
    }
}

/// Descriptor of a single tool.
#[derive(Debug)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Arc<JsonObject>,
    handler: ToolHandler,
}

impl ToolDefinition {
    /// Create a typed tool.
    ///
    /// The input schema is generated from `P`. Incoming arguments are
    /// deserialized into `P` before `handler` runs; a mismatch is reported
    /// as [`HandlerError::InvalidArguments`].
    pub fn new<P, R, E, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<Self, ToolError>
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        R: Serialize,
        E: Into<HandlerError>,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let raw = move |arguments: JsonObject| -> ToolFuture {
            let handler = handler.clone();
            async move {
                let params: P = serde_json::from_value(Value::Object(arguments))
                    .map_err(|e| HandlerError::invalid_arguments(e.to_string()))?;
                let output = (*handler)(params).await.map_err(Into::<HandlerError>::into)?;
                serde_json::to_value(output).map_err(HandlerError::serialization)
            }
            .boxed()
        };

        Self::from_raw(name, description, cached_schema_for_type::<P>(), raw)
    }

    /// Create a tool from an explicit schema and a raw handler.
    pub fn from_raw<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Arc<JsonObject>,
        handler: F,
    ) -> Result<Self, ToolError>
    where
        F: Fn(JsonObject) -> ToolFuture + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolError::invalid_definition("tool name cannot be empty"));
        }

        let description = description.into();
        if description.trim().is_empty() {
            return Err(ToolError::invalid_definition(format!(
                "tool {name} has an empty description"
            )));
        }

        Ok(Self {
            name,
            description,
            input_schema,
            handler: ToolHandler::new(handler),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Arc<JsonObject> {
        &self.input_schema
    }

    pub fn handler(&self) -> &ToolHandler {
        &self.handler
    }

    /// The outward view of this tool, without its handler.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// Discovery entry: `{name, description, inputSchema}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema", serialize_with = "serialize_schema")]
    pub input_schema: Arc<JsonObject>,
}

fn serialize_schema<S: Serializer>(schema: &Arc<JsonObject>, serializer: S) -> Result<S::Ok, S::Error> {
    schema.as_ref().serialize(serializer)
}

impl From<ToolDescriptor> for Tool {
    fn from(descriptor: ToolDescriptor) -> Self {
        Tool {
            name: descriptor.name.into(),
            description: Some(descriptor.description.into()),
            input_schema: descriptor.input_schema,
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoParams {
        /// Text to echo back.
        text: String,
    }

    fn echo_tool() -> ToolDefinition {
        ToolDefinition::new("echo", "Echo the given text", |p: EchoParams| async move {
            Ok::<_, HandlerError>(json!({ "echo": p.text }))
        })
        .unwrap()
    }

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_schema_generated_from_params() {
        let tool = echo_tool();
        let schema = Value::Object(tool.input_schema().as_ref().clone());
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["text"].is_object());
    }

    #[tokio::test]
    async fn test_typed_handler_round_trip() {
        let tool = echo_tool();
        let out = tool.handler().call(args(json!({ "text": "hi" }))).await.unwrap();
        assert_eq!(out, json!({ "echo": "hi" }));
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_bad_arguments() {
        let tool = echo_tool();
        let err = tool.handler().call(args(json!({ "txt": "hi" }))).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArguments(_)));
        assert!(err.message().starts_with("Invalid arguments:"));
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct NoParams {}

    #[tokio::test]
    async fn test_unserializable_result_is_serialization_error() {
        use std::collections::HashMap;

        let tool = ToolDefinition::new("tuple_keys", "Returns a map with tuple keys", |_: NoParams| async move {
            let mut map = HashMap::new();
            map.insert((1u8, 2u8), 3u8);
            Ok::<_, HandlerError>(map)
        })
        .unwrap();
        let err = tool.handler().call(JsonObject::new()).await.unwrap_err();
        assert!(matches!(err, HandlerError::Serialization(_)));
    }

    #[test]
    fn test_empty_name_or_description_rejected() {
        let schema = Arc::new(JsonObject::new());
        let noop = |_: JsonObject| -> ToolFuture { async { Ok(Value::Null) }.boxed() };

        let err = ToolDefinition::from_raw(" ", "desc", schema.clone(), noop).unwrap_err();
        assert!(matches!(err, ToolError::InvalidDefinition(_)));

        let err = ToolDefinition::from_raw("name", "", schema, noop).unwrap_err();
        assert!(matches!(err, ToolError::InvalidDefinition(_)));
    }

    #[test]
    fn test_descriptor_serializes_three_keys() {
        let descriptor = echo_tool().descriptor();
        let value = serde_json::to_value(&descriptor).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["description", "inputSchema", "name"]);
        assert_eq!(value["name"], "echo");
    }

    #[test]
    fn test_descriptor_into_rmcp_tool() {
        let tool: Tool = echo_tool().descriptor().into();
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.description.as_deref(), Some("Echo the given text"));
    }
}
