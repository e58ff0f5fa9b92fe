//! Resource handlers: produce the content behind a resource URI.

use std::future::Future;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use super::error::ResourceError;
use super::templates::UriParams;

/// The result of reading a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceReadResult {
    /// Text content.
    Text {
        content: String,
        mime_type: Option<String>,
    },

    /// Binary content, sent base64-encoded.
    Binary {
        content: Vec<u8>,
        mime_type: Option<String>,
    },
}

impl ResourceReadResult {
    /// Text content using the registered MIME type.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            mime_type: None,
        }
    }

    pub fn json(value: &serde_json::Value) -> Result<Self, ResourceError> {
        let content =
            serde_json::to_string_pretty(value).map_err(|e| ResourceError::internal(e.to_string()))?;
        Ok(Self::Text {
            content,
            mime_type: Some("application/json".to_string()),
        })
    }
}

/// Reads a registered resource.
///
/// `params` holds the variables captured by a URI template and is empty for
/// resources registered under a fixed URI.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self, uri: &str, params: &UriParams)
        -> Result<ResourceReadResult, ResourceError>;
}

type BoxedResourceFn = dyn Fn(String, UriParams) -> BoxFuture<'static, Result<ResourceReadResult, ResourceError>>
    + Send
    + Sync;

/// A handler backed by a closure.
pub struct FnResource {
    f: Box<BoxedResourceFn>,
}

#[async_trait]
impl ResourceHandler for FnResource {
    async fn read(
        &self,
        uri: &str,
        params: &UriParams,
    ) -> Result<ResourceReadResult, ResourceError> {
        (self.f)(uri.to_string(), params.clone()).await
    }
}

/// Wrap a closure over `(uri, params)` as a [`ResourceHandler`].
pub fn resource_fn<F, Fut>(f: F) -> FnResource
where
    F: Fn(String, UriParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResourceReadResult, ResourceError>> + Send + 'static,
{
    FnResource {
        f: Box::new(move |uri, params| f(uri, params).boxed()),
    }
}
