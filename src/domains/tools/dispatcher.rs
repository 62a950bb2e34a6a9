//! Dispatcher - routes discovery and call requests to the registry.
//!
//! Every tool call goes through [`Dispatcher::call_tool`] or
//! [`Dispatcher::call_request`]. An unknown tool name is a protocol fault
//! ([`DispatchError`]); anything that goes wrong inside a known tool, panics
//! included, becomes a normal response with `isError: true`.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use rmcp::model::{CallToolResult, Content, JsonObject, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use super::definition::ToolDescriptor;
use super::error::{DispatchError, HandlerError, ToolError};
use super::registry::ToolRegistry;

/// How responses of concurrent invocations relate to request order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseOrdering {
    /// Invocations run concurrently; responses are matched by request id
    /// and may complete in any order.
    #[default]
    Concurrent,
    /// Invocations run one at a time, in arrival order.
    ///
    /// A call arrives when [`Dispatcher::call_tool`] is called or when its
    /// request id is passed to [`Dispatcher::reserve`], whichever is first.
    Sequential,
}

impl ResponseOrdering {
    /// Parse an ordering name, falling back to the default.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "sequential" | "ordered" => Self::Sequential,
            _ => Self::Concurrent,
        }
    }
}

/// Passed down the queue when a call finishes or gives up its place.
///
/// A call that gives up its place before its turn forwards the receiver it
/// was waiting on, so its successor still waits for the call before it.
#[derive(Debug)]
struct Handoff(Option<oneshot::Receiver<Handoff>>);

/// Place in the arrival queue, taken synchronously.
#[derive(Debug)]
struct Ticket {
    previous: Option<oneshot::Receiver<Handoff>>,
    done: Option<oneshot::Sender<Handoff>>,
}

impl Ticket {
    /// Wait until every earlier ticket has finished.
    async fn wait(mut self) -> Turn {
        while let Some(previous) = self.previous.as_mut() {
            self.previous = match previous.await {
                Ok(Handoff(next)) => next,
                Err(_) => None,
            };
        }
        Turn {
            _done: self.done.take(),
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if let (Some(previous), Some(done)) = (self.previous.take(), self.done.take()) {
            let _ = done.send(Handoff(Some(previous)));
        }
    }
}

/// Held while a sequential call runs; dropping it admits the next ticket.
#[derive(Debug)]
struct Turn {
    _done: Option<oneshot::Sender<Handoff>>,
}

/// FIFO queue of tickets, chained through oneshot channels.
#[derive(Debug, Default)]
struct ArrivalGate {
    tail: Mutex<Option<oneshot::Receiver<Handoff>>>,
}

impl ArrivalGate {
    fn ticket(&self) -> Ticket {
        let (done, next) = oneshot::channel();
        let previous = self
            .tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(next);
        Ticket {
            previous,
            done: Some(done),
        }
    }
}

/// Outcome of one invocation, before it is put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(Value),
    DomainFailure(String),
}

impl CallOutcome {
    /// Serialize the outcome into the response envelope.
    pub fn into_response(self) -> Result<ToolResponse, serde_json::Error> {
        match self {
            Self::Success(value) => Ok(ToolResponse::text(serde_json::to_string(&value)?, None)),
            Self::DomainFailure(message) => Ok(ToolResponse::text(
                serde_json::to_string(&json!({ "error": message }))?,
                Some(true),
            )),
        }
    }
}

/// One content block of a tool response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Tool response envelope: `{content: [...], isError?: bool}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResponse {
    fn text(text: String, is_error: Option<bool>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text }],
            is_error,
        }
    }

    /// Whether this response carries a domain failure.
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// The text of the first content block.
    pub fn text_content(&self) -> Option<&str> {
        self.content.first().map(|ContentBlock::Text { text }| text.as_str())
    }
}

impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        let is_error = response.is_error;
        let content = response
            .content
            .into_iter()
            .map(|ContentBlock::Text { text }| Content::text(text))
            .collect();
        let mut result = if is_error == Some(true) {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        };
        result.is_error = is_error;
        result
    }
}

/// Request handler bound to a read-only registry.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    gate: Option<ArrivalGate>,
    reserved: Mutex<HashMap<RequestId, Ticket>>,
}

impl Dispatcher {
    /// Create a dispatcher over `registry`.
    pub fn new(registry: ToolRegistry, ordering: ResponseOrdering) -> Self {
        let gate = match ordering {
            ResponseOrdering::Concurrent => None,
            ResponseOrdering::Sequential => Some(ArrivalGate::default()),
        };
        Self {
            registry: Arc::new(registry),
            gate,
            reserved: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn ordering(&self) -> ResponseOrdering {
        if self.gate.is_some() {
            ResponseOrdering::Sequential
        } else {
            ResponseOrdering::Concurrent
        }
    }

    /// Discovery: every registered tool as `{name, description, inputSchema}`.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry
            .tool_definitions()
            .iter()
            .map(|definition| definition.descriptor())
            .collect()
    }

    /// Take the arrival place of request `id` now, before its call is
    /// scheduled. Transports call this while reading requests. No-op under
    /// [`ResponseOrdering::Concurrent`].
    pub fn reserve(&self, id: RequestId) {
        if let Some(gate) = &self.gate {
            let ticket = gate.ticket();
            self.reserved_map().insert(id, ticket);
        }
    }

    /// Invocation: run the named tool and build its response.
    ///
    /// The arrival place is taken when this is called, not when the
    /// returned future is first polled.
    pub fn call_tool(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> impl Future<Output = Result<ToolResponse, DispatchError>> + Send {
        let ticket = self.gate.as_ref().map(ArrivalGate::ticket);
        self.run(name, arguments, ticket)
    }

    /// Invocation for request `id`, using the place reserved for it if any.
    pub fn call_request(
        &self,
        id: &RequestId,
        name: &str,
        arguments: JsonObject,
    ) -> impl Future<Output = Result<ToolResponse, DispatchError>> + Send {
        let ticket = self.gate.as_ref().map(|gate| {
            self.reserved_map()
                .remove(id)
                .unwrap_or_else(|| gate.ticket())
        });
        self.run(name, arguments, ticket)
    }

    fn reserved_map(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, Ticket>> {
        self.reserved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn is_reserved(&self, id: &RequestId) -> bool {
        self.reserved_map().contains_key(id)
    }

    #[instrument(skip(self, arguments, ticket))]
    async fn run(
        &self,
        name: &str,
        arguments: JsonObject,
        ticket: Option<Ticket>,
    ) -> Result<ToolResponse, DispatchError> {
        let _turn = match ticket {
            Some(ticket) => Some(ticket.wait().await),
            None => None,
        };

        if self.registry.get_handler(name).is_none() {
            warn!("Unknown tool requested: {}", name);
            return Err(DispatchError::UnknownTool(name.to_string()));
        }

        info!("Calling tool: {}", name);
        let outcome = self.execute(name, arguments).await?;
        if let CallOutcome::DomainFailure(message) = &outcome {
            warn!(tool = %name, "Tool execution failed: {}", message);
        }

        outcome.into_response().map_err(|source| DispatchError::Serialization {
            tool: name.to_string(),
            source,
        })
    }

    /// Run the handler inside the containment boundary.
    async fn execute(&self, name: &str, arguments: JsonObject) -> Result<CallOutcome, DispatchError> {
        let run = AssertUnwindSafe(self.registry.execute_tool(name, arguments)).catch_unwind();
        match run.await {
            Ok(Ok(value)) => {
                debug!("Tool {} succeeded", name);
                Ok(CallOutcome::Success(value))
            }
            // A result that cannot be serialized breaks the handler contract.
            Ok(Err(ToolError::Handler(HandlerError::Serialization(source)))) => {
                Err(DispatchError::Serialization {
                    tool: name.to_string(),
                    source: source.into_inner(),
                })
            }
            Ok(Err(ToolError::Handler(err))) => Ok(CallOutcome::DomainFailure(err.message())),
            Ok(Err(err)) => Ok(CallOutcome::DomainFailure(err.to_string())),
            Err(payload) => Ok(CallOutcome::DomainFailure(panic_message(payload.as_ref()))),
        }
    }
}

/// Message carried by a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definition::{ToolDefinition, ToolFuture};
    use schemars::JsonSchema;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct ListParams {
        #[allow(dead_code)]
        filter: Option<String>,
    }

    fn raw_tool<F>(name: &str, handler: F) -> ToolDefinition
    where
        F: Fn(JsonObject) -> ToolFuture + Send + Sync + 'static,
    {
        ToolDefinition::from_raw(name, format!("Test tool {name}"), Arc::new(JsonObject::new()), handler).unwrap()
    }

    fn dispatcher_with(tools: Vec<ToolDefinition>) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register_tool(tool).unwrap();
        }
        Dispatcher::new(registry, ResponseOrdering::Concurrent)
    }

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    fn error_text(response: &ToolResponse) -> String {
        let body: Value = serde_json::from_str(response.text_content().unwrap()).unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_todos_list_success_scenario() {
        let tool = ToolDefinition::new("todos_list", "List to-dos", |_: ListParams| async move {
            Ok::<_, HandlerError>(json!({ "items": [{ "id": "1", "title": "Test" }] }))
        })
        .unwrap();
        let dispatcher = dispatcher_with(vec![tool]);

        let response = dispatcher
            .call_tool("todos_list", args(json!({ "filter": "today" })))
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "content": [{ "type": "text", "text": r#"{"items":[{"id":"1","title":"Test"}]}"# }]
            })
        );
    }

    #[tokio::test]
    async fn test_todos_list_failure_scenario() {
        let tool = ToolDefinition::new("todos_list", "List to-dos", |_: ListParams| async move {
            Err::<Value, _>(HandlerError::failed("Things3 is not running"))
        })
        .unwrap();
        let dispatcher = dispatcher_with(vec![tool]);

        let response = dispatcher
            .call_tool("todos_list", args(json!({ "filter": "today" })))
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "content": [{ "type": "text", "text": r#"{"error":"Things3 is not running"}"# }],
                "isError": true
            })
        );
    }

    /// Formatted log output collected for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<StdMutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn test_domain_failure_is_logged_with_tool_and_message() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let tool = ToolDefinition::new("todos_list", "List to-dos", |_: ListParams| async move {
            Err::<Value, _>(HandlerError::failed("Things3 is not running"))
        })
        .unwrap();
        let dispatcher = dispatcher_with(vec![tool]);
        let response = dispatcher.call_tool("todos_list", JsonObject::new()).await.unwrap();
        assert!(response.is_error());

        let output = logs.contents();
        let line = output
            .lines()
            .find(|line| line.contains("Tool execution failed"))
            .expect("domain failure was not logged");
        assert!(line.contains("WARN"));
        assert!(line.contains("todos_list"));
        assert!(line.contains("Things3 is not running"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_fault() {
        let dispatcher = dispatcher_with(vec![]);
        let err = dispatcher.call_tool("unknown_tool", JsonObject::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool(_)));
        assert_eq!(err.to_string(), "Unknown tool: unknown_tool");
    }

    #[tokio::test]
    async fn test_success_values_serialize_verbatim() {
        let values = vec![
            json!({}),
            json!([]),
            json!(null),
            json!("text"),
            json!(3.5),
            json!({ "a": { "b": [1, { "c": [] }] } }),
        ];
        for value in values {
            let reply = value.clone();
            let dispatcher = dispatcher_with(vec![raw_tool("echo", move |_| {
                let reply = reply.clone();
                async move { Ok(reply) }.boxed()
            })]);

            let response = dispatcher.call_tool("echo", JsonObject::new()).await.unwrap();
            assert_eq!(response.is_error, None);
            assert_eq!(response.text_content().unwrap(), serde_json::to_string(&value).unwrap());
            assert!(!serde_json::to_value(&response).unwrap().as_object().unwrap().contains_key("isError"));
        }
    }

    #[tokio::test]
    async fn test_thrown_string_becomes_error_response() {
        let dispatcher = dispatcher_with(vec![raw_tool("throws", |_| {
            async { Err(HandlerError::thrown("raw string value")) }.boxed()
        })]);

        let response = dispatcher.call_tool("throws", JsonObject::new()).await.unwrap();
        assert!(response.is_error());
        assert_eq!(error_text(&response), "raw string value");
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_domain_failures() {
        let tool = ToolDefinition::new("todos_list", "List to-dos", |_: ListParams| async move {
            Ok::<_, HandlerError>(json!([]))
        })
        .unwrap();
        let dispatcher = dispatcher_with(vec![tool]);

        let response = dispatcher
            .call_tool("todos_list", args(json!({ "filter": 12 })))
            .await
            .unwrap();
        assert!(response.is_error());
        assert!(error_text(&response).starts_with("Invalid arguments:"));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let dispatcher = dispatcher_with(vec![raw_tool("panics", |_| {
            async { panic!("handler exploded") }.boxed()
        })]);

        let response = dispatcher.call_tool("panics", JsonObject::new()).await.unwrap();
        assert!(response.is_error());
        assert_eq!(error_text(&response), "handler exploded");

        // The dispatcher keeps serving after a panic.
        let err = dispatcher.call_tool("missing", JsonObject::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: missing");
    }

    #[tokio::test]
    async fn test_serialization_failure_is_protocol_fault() {
        let tool = ToolDefinition::new("bad_result", "Returns tuple keys", |_: ListParams| async move {
            let mut map = HashMap::new();
            map.insert((1u8, 2u8), 3u8);
            Ok::<_, HandlerError>(map)
        })
        .unwrap();
        let dispatcher = dispatcher_with(vec![tool]);

        let err = dispatcher.call_tool("bad_result", JsonObject::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Serialization { ref tool, .. } if tool == "bad_result"));
        assert_eq!(err.code(), -32603);
    }

    #[tokio::test]
    async fn test_handler_parse_error_is_domain_failure() {
        let dispatcher = dispatcher_with(vec![raw_tool("decodes_backend", |_| {
            async {
                let decoded: Value = serde_json::from_str("{")?;
                Ok::<_, HandlerError>(decoded)
            }
            .boxed()
        })]);

        let response = dispatcher.call_tool("decodes_backend", JsonObject::new()).await.unwrap();
        assert!(response.is_error());
        assert!(error_text(&response).contains("EOF"));
    }

    #[test]
    fn test_discovery_lists_every_tool_without_handlers() {
        let dispatcher = dispatcher_with(vec![
            raw_tool("todos_list", |_| async { Ok(Value::Null) }.boxed()),
            raw_tool("projects_list", |_| async { Ok(Value::Null) }.boxed()),
        ]);

        let first = dispatcher.list_tools();
        let second = dispatcher.list_tools();
        assert_eq!(first, second);

        let names: Vec<_> = first.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["todos_list", "projects_list"]);

        for entry in serde_json::to_value(&first).unwrap().as_array().unwrap() {
            let mut keys: Vec<_> = entry.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            assert_eq!(keys, vec!["description", "inputSchema", "name"]);
        }
    }

    #[test]
    fn test_empty_catalog_is_valid() {
        let dispatcher = dispatcher_with(vec![]);
        assert!(dispatcher.list_tools().is_empty());
    }

    #[test]
    fn test_response_into_call_tool_result() {
        let ok: CallToolResult = CallOutcome::Success(json!({ "a": 1 })).into_response().unwrap().into();
        assert_eq!(ok.is_error, None);
        assert_eq!(ok.content.len(), 1);

        let failed: CallToolResult = CallOutcome::DomainFailure("nope".to_string())
            .into_response()
            .unwrap()
            .into();
        assert_eq!(failed.is_error, Some(true));
    }

    #[test]
    fn test_ordering_parse() {
        assert_eq!(ResponseOrdering::parse("sequential"), ResponseOrdering::Sequential);
        assert_eq!(ResponseOrdering::parse("Ordered"), ResponseOrdering::Sequential);
        assert_eq!(ResponseOrdering::parse("concurrent"), ResponseOrdering::Concurrent);
        assert_eq!(ResponseOrdering::parse("whatever"), ResponseOrdering::Concurrent);
    }

    /// Dispatcher with a slow and a fast tool that log their completion.
    fn timed_dispatcher(ordering: ResponseOrdering, log: Arc<StdMutex<Vec<&'static str>>>) -> Arc<Dispatcher> {
        let slow_log = log.clone();
        let fast_log = log;
        let mut registry = ToolRegistry::new();
        registry
            .register_tool(raw_tool("slow", move |_| {
                let log = slow_log.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    log.lock().unwrap().push("slow");
                    Ok(Value::Null)
                }
                .boxed()
            }))
            .unwrap();
        registry
            .register_tool(raw_tool("fast", move |_| {
                let log = fast_log.clone();
                async move {
                    log.lock().unwrap().push("fast");
                    Ok(Value::Null)
                }
                .boxed()
            }))
            .unwrap();
        Arc::new(Dispatcher::new(registry, ordering))
    }

    async fn run_slow_then_fast(dispatcher: Arc<Dispatcher>) {
        let slow = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.call_tool("slow", JsonObject::new()).await })
        };
        // Let the slow call start before the fast one arrives.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fast = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.call_tool("fast", JsonObject::new()).await })
        };
        slow.await.unwrap().unwrap();
        fast.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_ordering_lets_fast_call_finish_first() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = timed_dispatcher(ResponseOrdering::Concurrent, log.clone());
        run_slow_then_fast(dispatcher).await;
        assert_eq!(*log.lock().unwrap(), vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_sequential_ordering_preserves_arrival_order() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = timed_dispatcher(ResponseOrdering::Sequential, log.clone());
        assert_eq!(dispatcher.ordering(), ResponseOrdering::Sequential);
        run_slow_then_fast(dispatcher).await;
        assert_eq!(*log.lock().unwrap(), vec!["slow", "fast"]);
    }

    /// Dispatcher with `first`, `second` and `third` tools that log when they run.
    fn recording_dispatcher(ordering: ResponseOrdering, log: Arc<StdMutex<Vec<&'static str>>>) -> Arc<Dispatcher> {
        let mut registry = ToolRegistry::new();
        for name in ["first", "second", "third"] {
            let log = log.clone();
            registry
                .register_tool(raw_tool(name, move |_| {
                    let log = log.clone();
                    async move {
                        tokio::task::yield_now().await;
                        log.lock().unwrap().push(name);
                        Ok(Value::Null)
                    }
                    .boxed()
                }))
                .unwrap();
        }
        Arc::new(Dispatcher::new(registry, ordering))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sequential_order_follows_calls_not_polling() {
        for _ in 0..100 {
            let log = Arc::new(StdMutex::new(Vec::new()));
            let dispatcher = recording_dispatcher(ResponseOrdering::Sequential, log.clone());

            let first = dispatcher.call_tool("first", JsonObject::new());
            let second = dispatcher.call_tool("second", JsonObject::new());
            let (second, first) = tokio::join!(second, first);
            first.unwrap();
            second.unwrap();

            assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reserved_requests_run_in_arrival_order_when_spawned_back_to_back() {
        for _ in 0..100 {
            let log = Arc::new(StdMutex::new(Vec::new()));
            let dispatcher = recording_dispatcher(ResponseOrdering::Sequential, log.clone());
            dispatcher.reserve(RequestId::Number(1));
            dispatcher.reserve(RequestId::Number(2));
            assert!(dispatcher.is_reserved(&RequestId::Number(2)));

            let second = {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher
                        .call_request(&RequestId::Number(2), "second", JsonObject::new())
                        .await
                })
            };
            let first = {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher
                        .call_request(&RequestId::Number(1), "first", JsonObject::new())
                        .await
                })
            };
            first.await.unwrap().unwrap();
            second.await.unwrap().unwrap();

            assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
            assert!(!dispatcher.is_reserved(&RequestId::Number(1)));
        }
    }

    #[tokio::test]
    async fn test_dropped_call_keeps_its_successor_waiting() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = recording_dispatcher(ResponseOrdering::Sequential, log.clone());

        let first = dispatcher.call_tool("first", JsonObject::new());
        let second = dispatcher.call_tool("second", JsonObject::new());
        let third = dispatcher.call_tool("third", JsonObject::new());
        drop(second);

        let (third, first) = tokio::join!(third, first);
        first.unwrap();
        third.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_releases_its_turn() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = recording_dispatcher(ResponseOrdering::Sequential, log.clone());

        let missing = dispatcher.call_tool("missing", JsonObject::new());
        let first = dispatcher.call_tool("first", JsonObject::new());
        let (first, missing) = tokio::join!(first, missing);

        assert_eq!(missing.unwrap_err().to_string(), "Unknown tool: missing");
        first.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn test_reserve_is_noop_when_concurrent() {
        let dispatcher = recording_dispatcher(ResponseOrdering::Concurrent, Arc::new(StdMutex::new(Vec::new())));
        dispatcher.reserve(RequestId::Number(1));
        assert!(!dispatcher.is_reserved(&RequestId::Number(1)));
    }
}
