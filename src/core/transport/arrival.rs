//! Arrival-order bookkeeping for rmcp transports.
//!
//! rmcp reads requests one at a time but runs each on its own task, so the
//! order in which handlers start says nothing about the order requests were
//! read. [`ArrivalOrder`] wraps a transport and reserves a dispatcher place
//! for every `tools/call` as it is read.

use std::future::Future;

use rmcp::RoleServer;
use rmcp::model::{ClientRequest, JsonRpcMessage, JsonRpcRequest};
use rmcp::service::{RxJsonRpcMessage, TxJsonRpcMessage};
use rmcp::transport::{IntoTransport, Transport};
use tracing::trace;

use crate::core::McpServer;

/// Transport that reserves call order in the server's dispatcher.
pub struct ArrivalOrder<T> {
    inner: T,
    server: McpServer,
}

/// Wrap `io` so `tools/call` requests keep their read order.
pub fn arrival_ordered<S, A>(
    io: S,
    server: McpServer,
) -> ArrivalOrder<impl Transport<RoleServer, Error = std::io::Error>>
where
    S: IntoTransport<RoleServer, std::io::Error, A>,
{
    ArrivalOrder {
        inner: io.into_transport(),
        server,
    }
}

impl<T> Transport<RoleServer> for ArrivalOrder<T>
where
    T: Transport<RoleServer>,
{
    type Error = T::Error;

    fn send(
        &mut self,
        item: TxJsonRpcMessage<RoleServer>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        self.inner.send(item)
    }

    fn receive(&mut self) -> impl Future<Output = Option<RxJsonRpcMessage<RoleServer>>> + Send {
        let server = self.server.clone();
        let next = self.inner.receive();
        async move {
            let message = next.await?;
            if let JsonRpcMessage::Request(JsonRpcRequest {
                id,
                request: ClientRequest::CallToolRequest(_),
                ..
            }) = &message
            {
                trace!("Reserving call order for request {}", id);
                server.dispatcher().reserve(id.clone());
            }
            Some(message)
        }
    }

    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.inner.close()
    }
}
