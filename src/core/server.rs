//! MCP server handler.
//!
//! [`McpServer`] serves whatever the module loader registered on the
//! [`ServerHandle`]. It adds no capabilities of its own: listing and
//! dispatch go straight to the handle, so adding a unit never touches this
//! file.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::*,
    service::RequestContext,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::handle::ServerHandle;
use crate::domains::prompts::PromptError;
use crate::domains::resources::ResourceError;
use crate::domains::tools::ToolError;

/// The MCP server handler. Cheap to clone.
#[derive(Clone)]
pub struct McpServer {
    handle: Arc<ServerHandle>,
}

impl McpServer {
    /// Freeze a populated handle for serving.
    pub fn new(handle: ServerHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    pub fn handle(&self) -> &ServerHandle {
        &self.handle
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn version(&self) -> &str {
        self.handle.version()
    }

    /// Capabilities and identity advertised during initialization.
    pub fn server_info(&self) -> ServerInfo {
        let mut implementation = Implementation::from_build_env();
        implementation.name = self.name().to_string();
        implementation.version = self.version().to_string();

        ServerInfo {
            instructions: Some(format!(
                "{} serves {} tool(s), {} resource(s), {} resource template(s) and {} prompt(s) \
                 registered at startup.",
                self.name(),
                self.handle.tools().len(),
                self.handle.resources().len(),
                self.handle.resource_templates().len(),
                self.handle.prompts().len(),
            )),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: implementation,
            ..Default::default()
        }
    }

    // ========================================================================
    // Shared dispatch (used by every transport)
    // ========================================================================

    /// Run a tool and wrap its output as a tool result.
    ///
    /// An unknown tool is a protocol error; a tool that fails is reported
    /// in-band with `is_error` set.
    pub async fn invoke_tool(&self, request: CallToolRequestParam) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);

        match self.handle.call_tool(&request.name, arguments).await {
            Ok(value) => Ok(tool_output(value)),
            Err(ToolError::NotFound(name)) => Err(McpError::invalid_params(
                format!("Tool not found: {}", name),
                None,
            )),
            Err(e) => {
                warn!(tool = %request.name, "Tool call failed: {}", e);
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    pub async fn fetch_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        self.handle.read_resource(uri).await.map_err(|e| match e {
            ResourceError::NotFound(_) => McpError::resource_not_found(e.to_string(), None),
            ResourceError::InvalidUri(_) | ResourceError::MissingParameter(_) => {
                McpError::invalid_params(e.to_string(), None)
            }
            _ => McpError::internal_error(e.to_string(), None),
        })
    }

    /// Render a prompt. Non-string argument values are ignored.
    pub fn render_prompt(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<GetPromptResult, McpError> {
        let arguments = arguments.map(|map| {
            map.into_iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                .collect::<HashMap<_, _>>()
        });

        self.handle.get_prompt(name, arguments).map_err(|e| match e {
            PromptError::TemplateError(_) => McpError::internal_error(e.to_string(), None),
            _ => McpError::invalid_params(e.to_string(), None),
        })
    }
}

/// Text content for every result; structured content when it is an object.
fn tool_output(value: Value) -> CallToolResult {
    let text = match &value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: value.is_object().then_some(value),
        is_error: Some(false),
        meta: None,
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        self.server_info()
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.handle.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        self.invoke_tool(request).await
    }

    #[instrument(skip(self, _context))]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        info!("Listing resources");
        Ok(ListResourcesResult {
            resources: self.handle.resources(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        info!("Listing resource templates");
        Ok(ListResourceTemplatesResult {
            resource_templates: self.handle.resource_templates(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        info!("Reading resource: {}", request.uri);
        self.fetch_resource(&request.uri).await
    }

    #[instrument(skip(self, _context))]
    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        info!("Listing prompts");
        Ok(ListPromptsResult {
            prompts: self.handle.prompts(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        info!("Getting prompt: {}", request.name);
        self.render_prompt(&request.name, request.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::domains::tools::{tool_model, typed_handler};
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct DivideParams {
        a: f64,
        b: f64,
    }

    fn server() -> McpServer {
        let mut handle = ServerHandle::new(Config::default());
        handle
            .add_tool(
                tool_model::<DivideParams>("divide", "Divide a by b"),
                typed_handler(|p: DivideParams| async move {
                    if p.b == 0.0 {
                        Err(ToolError::execution_failed("division by zero"))
                    } else {
                        Ok(json!({ "quotient": p.a / p.b }))
                    }
                }),
            )
            .unwrap();
        McpServer::new(handle)
    }

    fn call(name: &str, arguments: Value) -> CallToolRequestParam {
        serde_json::from_value(json!({ "name": name, "arguments": arguments })).unwrap()
    }

    #[tokio::test]
    async fn test_invoke_tool_success() {
        let result = server()
            .invoke_tool(call("divide", json!({ "a": 6.0, "b": 3.0 })))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content, Some(json!({ "quotient": 2.0 })));
    }

    #[tokio::test]
    async fn test_invoke_tool_failure_is_in_band() {
        let result = server()
            .invoke_tool(call("divide", json!({ "a": 1.0, "b": 0.0 })))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool_is_protocol_error() {
        tokio_test::assert_err!(server().invoke_tool(call("multiply", json!({}))).await);
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        tokio_test::assert_err!(server().fetch_resource("config://missing").await);
    }

    #[test]
    fn test_server_info() {
        let info = server().server_info();
        assert_eq!(info.server_info.name, "dynamic-mcp");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("1 tool(s)"));
    }

    #[test]
    fn test_tool_output_text() {
        let result = tool_output(json!("plain"));
        assert!(result.structured_content.is_none());
        match &result.content[0].raw {
            RawContent::Text(t) => assert_eq!(t.text, "plain"),
            other => panic!("unexpected content: {:?}", other),
        }
    }
}
