//! The server handle: the process-wide registry units register against.
//!
//! A handle is created once from [`Config`], populated by the module loader
//! through `&mut` access, and then frozen behind an `Arc` for serving.
//! Registrations only ever accumulate; a name that is already taken is
//! rejected rather than replaced.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rmcp::model::{
    AnnotateAble, GetPromptResult, Prompt, PromptMessage, PromptMessageRole, RawResource,
    RawResourceTemplate, ReadResourceResult, Resource, ResourceContents, ResourceTemplate, Tool,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::config::Config;
use crate::domains::prompts::{PromptError, PromptTemplate};
use crate::domains::resources::{
    ResourceError, ResourceHandler, ResourceReadResult, UriParams, UriTemplate,
};
use crate::domains::tools::{JsonObject, ToolError, ToolHandler};

/// Errors raised while registering against the handle.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A tool, resource, template or prompt with this name already exists.
    #[error("{kind} '{name}' is already registered")]
    Duplicate { kind: &'static str, name: String },

    /// A resource template could not be parsed.
    #[error("Invalid URI template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A prompt template has malformed syntax.
    #[error("Invalid prompt '{name}': {reason}")]
    InvalidPrompt { name: String, reason: String },
}

impl RegistrationError {
    fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            name: name.into(),
        }
    }
}

struct ToolEntry {
    tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

struct ResourceEntry {
    resource: Resource,
    handler: Arc<dyn ResourceHandler>,
}

struct TemplateEntry {
    template: ResourceTemplate,
    matcher: UriTemplate,
    handler: Arc<dyn ResourceHandler>,
}

/// Registry of everything the server exposes.
pub struct ServerHandle {
    config: Arc<Config>,
    tools: BTreeMap<String, ToolEntry>,
    resources: BTreeMap<String, ResourceEntry>,
    templates: Vec<TemplateEntry>,
    prompts: BTreeMap<String, PromptTemplate>,
}

impl ServerHandle {
    /// Create an empty handle for the given configuration.
    pub fn new(config: Config) -> Self {
        info!(
            name = %config.server.name,
            transport = config.transport.kind(),
            "Creating server handle"
        );
        Self {
            config: Arc::new(config),
            tools: BTreeMap::new(),
            resources: BTreeMap::new(),
            templates: Vec::new(),
            prompts: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a callable tool under `tool.name`.
    pub fn add_tool(
        &mut self,
        tool: Tool,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let name = tool.name.to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistrationError::duplicate("tool", name));
        }
        debug!(tool = %name, "Registering tool");
        self.tools.insert(
            name,
            ToolEntry {
                tool,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Register a resource with a fixed URI.
    pub fn add_resource(
        &mut self,
        resource: RawResource,
        handler: impl ResourceHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let uri = resource.uri.clone();
        if self.resources.contains_key(&uri) {
            return Err(RegistrationError::duplicate("resource", uri));
        }
        debug!(uri = %uri, "Registering resource");
        self.resources.insert(
            uri,
            ResourceEntry {
                resource: resource.no_annotation(),
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Register a URI-templated resource, e.g. `users://{user_id}/profile`.
    pub fn add_resource_template(
        &mut self,
        template: RawResourceTemplate,
        handler: impl ResourceHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let raw = template.uri_template.clone();
        if self
            .templates
            .iter()
            .any(|t| t.template.raw.uri_template == raw)
        {
            return Err(RegistrationError::duplicate("resource template", raw));
        }
        let matcher =
            UriTemplate::parse(&raw).map_err(|e| RegistrationError::InvalidTemplate {
                template: raw.clone(),
                reason: e.to_string(),
            })?;
        debug!(template = %raw, "Registering resource template");
        self.templates.push(TemplateEntry {
            template: template.no_annotation(),
            matcher,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Register a prompt template under its name. The template syntax is
    /// checked here so a malformed prompt fails its unit at load time.
    pub fn add_prompt(&mut self, template: PromptTemplate) -> Result<(), RegistrationError> {
        if self.prompts.contains_key(&template.name) {
            return Err(RegistrationError::duplicate("prompt", template.name));
        }
        template
            .validate()
            .map_err(|e| RegistrationError::InvalidPrompt {
                name: template.name.clone(),
                reason: e.to_string(),
            })?;
        debug!(prompt = %template.name, "Registering prompt");
        self.prompts.insert(template.name.clone(), template);
        Ok(())
    }

    // ========================================================================
    // Listing
    // ========================================================================

    pub fn tools(&self) -> Vec<Tool> {
        self.tools.values().map(|e| e.tool.clone()).collect()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.resources.values().map(|e| e.resource.clone()).collect()
    }

    pub fn resource_templates(&self) -> Vec<ResourceTemplate> {
        self.templates.iter().map(|e| e.template.clone()).collect()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .values()
            .map(|template| Prompt {
                name: template.name.clone(),
                title: None,
                description: template.description.clone(),
                arguments: Some(template.arguments.clone()),
                icons: None,
                meta: None,
            })
            .collect()
    }

    pub fn prompt_names(&self) -> Vec<&str> {
        self.prompts.keys().map(String::as_str).collect()
    }

    /// Total number of registrations of every kind.
    pub fn registration_count(&self) -> usize {
        self.tools.len() + self.resources.len() + self.templates.len() + self.prompts.len()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Invoke a registered tool with JSON object arguments.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;

        let arguments: JsonObject = match arguments {
            Value::Object(map) => map,
            Value::Null => JsonObject::new(),
            other => {
                return Err(ToolError::invalid_arguments(format!(
                    "expected an object, got {}",
                    other
                )));
            }
        };

        entry.handler.call(arguments).await
    }

    /// Read a resource by exact URI, falling back to template matching.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ResourceError> {
        let (handler, params, mime_type) = if let Some(entry) = self.resources.get(uri) {
            (
                entry.handler.clone(),
                UriParams::new(),
                entry.resource.raw.mime_type.clone(),
            )
        } else {
            self.templates
                .iter()
                .find_map(|entry| {
                    entry.matcher.matches(uri).map(|params| {
                        (
                            entry.handler.clone(),
                            params,
                            entry.template.raw.mime_type.clone(),
                        )
                    })
                })
                .ok_or_else(|| ResourceError::not_found(uri))?
        };

        let content = match handler.read(uri, &params).await? {
            ResourceReadResult::Text { content, mime_type: mt } => {
                ResourceContents::TextResourceContents {
                    uri: uri.to_string(),
                    mime_type: mt.or(mime_type),
                    text: content,
                    meta: None,
                }
            }
            ResourceReadResult::Binary { content, mime_type: mt } => {
                ResourceContents::BlobResourceContents {
                    uri: uri.to_string(),
                    mime_type: mt.or(mime_type),
                    blob: base64::Engine::encode(
                        &base64::engine::general_purpose::STANDARD,
                        content,
                    ),
                    meta: None,
                }
            }
        };

        Ok(ReadResourceResult {
            contents: vec![content],
        })
    }

    /// Render a prompt with arguments substituted.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<GetPromptResult, PromptError> {
        let template = self
            .prompts
            .get(name)
            .ok_or_else(|| PromptError::not_found(name))?;

        let arguments = arguments.unwrap_or_default();

        for arg in &template.arguments {
            if arg.required.unwrap_or(false) && !arguments.contains_key(&arg.name) {
                return Err(PromptError::missing_argument(&arg.name));
            }
        }

        let content = template.render(&arguments)?;

        Ok(GetPromptResult {
            description: template.description.clone(),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, content)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::prompts::PromptTemplateBuilder;
    use crate::domains::resources::resource_fn;
    use crate::domains::tools::{tool_model, typed_handler};
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct DoubleParams {
        x: i64,
    }

    fn handle() -> ServerHandle {
        ServerHandle::new(Config::default())
    }

    fn add_double(handle: &mut ServerHandle) -> Result<(), RegistrationError> {
        handle.add_tool(
            tool_model::<DoubleParams>("double", "Double a number"),
            typed_handler(|p: DoubleParams| async move { Ok(p.x * 2) }),
        )
    }

    #[tokio::test]
    async fn test_call_registered_tool() {
        let mut handle = handle();
        add_double(&mut handle).unwrap();

        let result = handle.call_tool("double", json!({ "x": 2 })).await.unwrap();
        assert_eq!(result, json!(4));
        assert_eq!(handle.tool_names(), vec!["double"]);
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let handle = handle();
        let err = handle.call_tool("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_call_with_non_object_arguments() {
        let mut handle = handle();
        add_double(&mut handle).unwrap();
        let err = handle.call_tool("double", json!([2])).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        let mut handle = handle();
        add_double(&mut handle).unwrap();
        let err = add_double(&mut handle).unwrap_err();
        assert!(matches!(err, RegistrationError::Duplicate { kind: "tool", .. }));
        assert_eq!(handle.tools().len(), 1);
    }

    #[tokio::test]
    async fn test_read_static_and_templated_resources() {
        let mut handle = handle();
        handle
            .add_resource(
                RawResource::new("config://app", "App Config"),
                resource_fn(|_uri, _params| async {
                    Ok(ResourceReadResult::text("App configuration here"))
                }),
            )
            .unwrap();
        handle
            .add_resource_template(
                RawResourceTemplate {
                    uri_template: "users://{user_id}/profile".to_string(),
                    name: "User Profile".to_string(),
                    title: None,
                    description: None,
                    mime_type: Some("text/plain".to_string()),
                },
                resource_fn(|_uri, params| {
                    let user = params.get("user_id").cloned().unwrap_or_default();
                    async move { Ok(ResourceReadResult::text(format!("Profile for {}", user))) }
                }),
            )
            .unwrap();

        let result = handle.read_resource("config://app").await.unwrap();
        assert_eq!(result.contents.len(), 1);

        let result = handle.read_resource("users://42/profile").await.unwrap();
        match &result.contents[0] {
            ResourceContents::TextResourceContents { text, mime_type, .. } => {
                assert_eq!(text, "Profile for 42");
                assert_eq!(mime_type.as_deref(), Some("text/plain"));
            }
            other => panic!("unexpected contents: {:?}", other),
        }

        assert!(handle.read_resource("users://42/settings").await.is_err());
    }

    #[test]
    fn test_invalid_template_rejected() {
        let mut handle = handle();
        let err = handle
            .add_resource_template(
                RawResourceTemplate {
                    uri_template: "users://{user_id/profile".to_string(),
                    name: "Broken".to_string(),
                    title: None,
                    description: None,
                    mime_type: None,
                },
                resource_fn(|_uri, _params| async { Ok(ResourceReadResult::text("")) }),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidTemplate { .. }));
        assert!(handle.resource_templates().is_empty());
    }

    #[test]
    fn test_malformed_prompt_rejected() {
        let mut handle = handle();
        let err = handle
            .add_prompt(
                PromptTemplateBuilder::new("broken")
                    .template("{{#if name}}Hello")
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPrompt { .. }));
        assert!(handle.prompts().is_empty());
    }

    #[test]
    fn test_get_prompt() {
        let mut handle = handle();
        handle
            .add_prompt(
                PromptTemplateBuilder::new("greeting")
                    .required_arg("name", "Who to greet")
                    .template("Hello, {{name}}!")
                    .build(),
            )
            .unwrap();

        let mut args = HashMap::new();
        args.insert("name".to_string(), "World".to_string());
        let result = handle.get_prompt("greeting", Some(args)).unwrap();
        assert_eq!(result.messages.len(), 1);

        assert!(matches!(
            handle.get_prompt("greeting", None),
            Err(PromptError::MissingArgument(_))
        ));
        assert!(matches!(
            handle.get_prompt("farewell", None),
            Err(PromptError::NotFound(_))
        ));
        assert_eq!(handle.registration_count(), 1);
    }
}
