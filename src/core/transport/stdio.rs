//! STDIO transport: rmcp's line-delimited JSON-RPC over stdin/stdout.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

pub struct StdioTransport;

impl StdioTransport {
    pub async fn run(server: McpServer) -> TransportResult<()> {
        let name = server.name().to_string();
        info!("{} ready - communicating via stdin/stdout", name);

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string()))?;

        info!(?reason, "STDIO transport finished");
        Ok(())
    }
}
