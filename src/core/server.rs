//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] is the composition root: it builds the task backend, the
//! tool registry and the dispatcher, owns the shutdown token of its single
//! channel, and implements the rmcp `ServerHandler` by delegating to the
//! dispatcher.
//!
//! Tools are not listed here. They are registered in
//! `domains/tools/catalog.rs`.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::config::Config;
use super::error::{Error, Result};
use super::transport::TransportService;
use crate::domains::things::build_backend;
use crate::domains::tools::{
    DispatchError, Dispatcher, ToolDescriptor, ToolRegistry, ToolResponse, build_tool_registry,
};

/// The main MCP server handler.
///
/// Clones share the same dispatcher, shutdown token and running flag, so a
/// clone handed to a transport and the original can both stop the server.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Discovery and call routing over the fixed tool registry.
    dispatcher: Arc<Dispatcher>,

    /// Cancelled by `stop()`; every transport watches it.
    shutdown: CancellationToken,

    /// Set while `start()` owns the channel.
    running: Arc<AtomicBool>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        let backend = build_backend(&config.backend);
        info!("Using {} task backend", backend.name());
        let registry = build_tool_registry(backend)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server around an already populated registry.
    pub fn with_registry(config: Config, registry: ToolRegistry) -> Self {
        info!(
            "Registered {} tools: {}",
            registry.tool_count(),
            registry.tool_names().join(", ")
        );
        let dispatcher = Dispatcher::new(registry, config.dispatch.ordering);

        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            shutdown: CancellationToken::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// List all available tools.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.dispatcher.list_tools()
    }

    /// Call a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> std::result::Result<ToolResponse, DispatchError> {
        self.dispatcher.call_tool(name, arguments).await
    }

    /// Token transports use to notice `stop()`.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Whether a `start()` call currently owns the channel.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Serve the configured transport until the channel closes or `stop()`
    /// is called.
    ///
    /// Returns immediately when the server was already stopped. Only one
    /// `start()` may be active at a time.
    pub async fn start(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            info!("Server already stopped, not starting");
            return Ok(());
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyRunning);
        }
        let _running = RunningGuard(self.running.clone());

        let transport = TransportService::new(self.config.transport.clone());
        transport.run(self.clone()).await?;

        info!("Channel closed");
        Ok(())
    }

    /// Release the channel. Safe to call any number of times, before or
    /// after `start()`.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Stopping server");
        }
        self.shutdown.cancel();
    }
}

/// Clears the running flag on every exit path of `start()`.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl From<DispatchError> for McpError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownTool(_) | DispatchError::InvalidRequest(_) => {
                McpError::invalid_params(err.to_string(), None)
            }
            DispatchError::Serialization { .. } => McpError::internal_error(err.to_string(), None),
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Manage Things3 to-dos and projects. Call tools/list for the available tools."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        let tools = self
            .dispatcher
            .list_tools()
            .into_iter()
            .map(Tool::from)
            .collect();
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, context), fields(tool = %request.name, id = %context.id))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        let response = self
            .dispatcher
            .call_request(&context.id, &request.name, arguments)
            .await?;
        Ok(response.into())
    }
}
