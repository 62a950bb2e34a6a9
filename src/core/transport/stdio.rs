//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.

use rmcp::ServiceExt;
use tracing::info;

use super::arrival::arrival_ordered;
use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin closes or the server is stopped.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let ct = server.shutdown_token();
        let transport = arrival_ordered(rmcp::transport::stdio(), server.clone());
        let service = tokio::select! {
            _ = ct.cancelled() => {
                info!("Stopped before the client initialized");
                return Ok(());
            }
            service = server.serve_with_ct(transport, ct.clone()) => {
                service.map_err(|e| TransportError::init(e.to_string()))?
            }
        };

        service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string()))?;

        info!("STDIO transport finished");
        Ok(())
    }
}
