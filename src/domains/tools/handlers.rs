//! Tool handlers: the callable side of a registered tool.
//!
//! A tool is registered as an rmcp [`Tool`] model plus a [`ToolHandler`].
//! Most units build both from a typed parameter struct:
//!
//! ```rust,ignore
//! handle.add_tool(
//!     tool_model::<DoubleParams>("double", "Double a number"),
//!     typed_handler(|p: DoubleParams| async move { Ok(p.x * 2) }),
//! )?;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use super::error::ToolError;
use crate::core::cache::TtlCache;

/// JSON object carrying tool arguments.
pub type JsonObject = serde_json::Map<String, Value>;

/// Executes a tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: JsonObject) -> Result<Value, ToolError>;
}

type BoxedToolFn = dyn Fn(JsonObject) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync;

/// A handler backed by a closure over raw JSON arguments.
pub struct FnTool {
    f: Box<BoxedToolFn>,
}

impl FnTool {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(JsonObject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self {
            f: Box::new(move |arguments| f(arguments).boxed()),
        }
    }
}

#[async_trait]
impl ToolHandler for FnTool {
    async fn call(&self, arguments: JsonObject) -> Result<Value, ToolError> {
        (self.f)(arguments).await
    }
}

/// Adapt a function over typed parameters into a [`ToolHandler`].
///
/// Arguments that fail to deserialize into `P` are reported as
/// [`ToolError::InvalidArguments`] without calling `f`.
pub fn typed_handler<P, R, F, Fut>(f: F) -> FnTool
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
{
    FnTool {
        f: Box::new(move |arguments| {
            match serde_json::from_value::<P>(Value::Object(arguments)) {
                Ok(params) => {
                    let call = f(params);
                    async move {
                        let output = call.await?;
                        serde_json::to_value(output).map_err(|e| ToolError::internal(e.to_string()))
                    }
                    .boxed()
                }
                Err(e) => futures::future::ready(Err(ToolError::invalid_arguments(e.to_string())))
                    .boxed(),
            }
        }),
    }
}

/// Build the rmcp tool model, deriving the input schema from `P`.
pub fn tool_model<P>(name: impl Into<String>, description: impl Into<String>) -> Tool
where
    P: JsonSchema + 'static,
{
    Tool {
        name: name.into().into(),
        description: Some(description.into().into()),
        input_schema: cached_schema_for_type::<P>(),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

/// Memoizes another handler's successful results for the cache's TTL.
///
/// The cache key is the JSON text of the arguments, so identical calls within
/// the TTL are answered without invoking the inner handler. Errors are never
/// cached.
pub struct CachedTool<H> {
    inner: H,
    cache: Arc<TtlCache<String, Value>>,
}

impl<H: ToolHandler> CachedTool<H> {
    pub fn new(inner: H, cache: Arc<TtlCache<String, Value>>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<H: ToolHandler> ToolHandler for CachedTool<H> {
    async fn call(&self, arguments: JsonObject) -> Result<Value, ToolError> {
        let key = Value::Object(arguments.clone()).to_string();
        if let Some(hit) = self.cache.get(&key).await {
            trace!(key = %key, "serving tool result from cache");
            return Ok(hit);
        }

        let value = self.inner.call(arguments).await?;
        self.cache.insert(key, value.clone()).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoParams {
        /// Text to echo back.
        text: String,
    }

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_typed_handler_roundtrip() {
        let handler = typed_handler(|p: EchoParams| async move { Ok(p.text.to_uppercase()) });
        let result = handler.call(object(json!({ "text": "hi" }))).await.unwrap();
        assert_eq!(result, json!("HI"));
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_bad_arguments() {
        let handler = typed_handler(|p: EchoParams| async move { Ok(p.text) });
        let err = handler.call(object(json!({ "txt": 1 }))).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_tool_model_schema() {
        let tool = tool_model::<EchoParams>("echo", "Echo text");
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.description.as_deref(), Some("Echo text"));
        let schema = serde_json::to_value(tool.input_schema.as_ref()).unwrap();
        assert!(schema["properties"].get("text").is_some());
    }

    #[tokio::test]
    async fn test_cached_tool_skips_repeat_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = FnTool::new(move |_args| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(json!(n)) }
        });
        let cache = Arc::new(TtlCache::new(10, Duration::from_secs(60)));
        let cached = CachedTool::new(inner, cache.clone());

        let first = cached.call(object(json!({ "q": "a" }))).await.unwrap();
        let second = cached.call(object(json!({ "q": "a" }))).await.unwrap();
        let other = cached.call(object(json!({ "q": "b" }))).await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_cached_tool_does_not_cache_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = FnTool::new(move |_args| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ToolError::execution_failed("upstream down")) }
        });
        let cached = CachedTool::new(inner, Arc::new(TtlCache::new(10, Duration::from_secs(60))));

        assert!(cached.call(JsonObject::new()).await.is_err());
        assert!(cached.call(JsonObject::new()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
