//! Server info resource unit.

use rmcp::model::RawResource;
use serde_json::json;

use crate::core::handle::ServerHandle;
use crate::domains::resources::{ResourceReadResult, resource_fn};
use crate::loader::{ImportContext, Unit, UnitError};

pub const SERVER_INFO_URI: &str = "mcp://server/info";

/// Publishes the server's name, version and transport as JSON.
pub struct ServerInfoUnit;

impl ServerInfoUnit {
    pub const ENTRY: &'static str = "server_info";

    pub fn import(_ctx: &ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> {
        Ok(Box::new(Self))
    }
}

impl Unit for ServerInfoUnit {
    fn register(&self, handle: &mut ServerHandle) -> Result<(), UnitError> {
        let config = handle.config().clone();
        let info = json!({
            "server": config.server.name,
            "version": config.server.version,
            "transport": config.transport.kind(),
        });

        let mut resource = RawResource::new(SERVER_INFO_URI, "Server Information");
        resource.description = Some("Information about this MCP server".to_string());
        resource.mime_type = Some("application/json".to_string());

        handle.add_resource(
            resource,
            resource_fn(move |_uri, _params| {
                let result = ResourceReadResult::json(&info);
                async move { result }
            }),
        )?;
        Ok(())
    }
}
