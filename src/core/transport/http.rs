//! HTTP transport.
//!
//! Two ways to talk JSON-RPC to the server:
//!
//! - `POST {rpc_path}`: one request per POST, the response in the body.
//! - `GET {sse_path}` opens an event stream. Its first `endpoint` event names
//!   the URL (`{messages_path}?session_id=...`) to POST requests to; each
//!   response then arrives on the stream as a `message` event.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt, stream};
use rmcp::ErrorData as McpError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{RwLock, mpsc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;

/// Responses buffered per event stream before senders wait.
const SESSION_BUFFER: usize = 32;

pub struct HttpTransport {
    config: HttpConfig,
}

// ============================================================================
// JSON-RPC envelopes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn parse_error() -> Self {
        Self::error(None, -32700, "Parse error")
    }

    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, -32601, format!("Method not found: {}", method))
    }

    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }

    fn from_mcp(id: Option<Value>, err: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code.0,
                message: err.message.to_string(),
                data: err.data,
            }),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

type Sessions = Arc<RwLock<HashMap<String, mpsc::Sender<JsonRpcResponse>>>>;

/// State shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: McpServer,
    sessions: Sessions,
    config: Arc<HttpConfig>,
}

/// Removes its session from the map when the event stream is dropped.
struct SessionGuard {
    session_id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let session_id = std::mem::take(&mut self.session_id);
        let sessions = Arc::clone(&self.sessions);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if sessions.write().await.remove(&session_id).is_some() {
                        info!(session = %session_id, "Event stream closed, dropped session");
                    }
                });
            }
            Err(_) => {
                if let Ok(mut sessions) = sessions.try_write() {
                    sessions.remove(&session_id);
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router serving `server`.
    pub fn router(&self, server: McpServer) -> Router {
        let state = AppState {
            server,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(self.config.clone()),
        };

        let mut app = Router::new()
            .route(&self.config.rpc_path, post(handle_rpc))
            .route(&self.config.sse_path, get(open_event_stream))
            .route(&self.config.messages_path, post(handle_message))
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        if self.config.enable_cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }
        app
    }

    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = self.router(server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(
            "Ready - listening on {} (CORS {})",
            addr,
            if self.config.enable_cors { "enabled" } else { "disabled" }
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → SSE:      GET {} + POST {}", self.config.sse_path, self.config.messages_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "rpc": state.config.rpc_path,
            "sse": state.config.sse_path,
            "messages": state.config.messages_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0"
    }))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "sessions": state.sessions.read().await.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn parse_request(body: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    serde_json::from_str(body).map_err(|e| {
        debug!("Rejecting malformed JSON-RPC body: {}", e);
        JsonRpcResponse::parse_error()
    })
}

#[instrument(skip_all)]
async fn handle_rpc(State(state): State<AppState>, body: String) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(response) => return (StatusCode::OK, Json(response)).into_response(),
    };

    match process_request(&state.server, request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn open_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel(SESSION_BUFFER);
    state.sessions.write().await.insert(session_id.clone(), tx);
    info!(session = %session_id, "Opened event stream");

    let endpoint = Event::default().event("endpoint").data(format!(
        "{}?session_id={}",
        state.config.messages_path, session_id
    ));

    let guard = SessionGuard {
        session_id,
        sessions: Arc::clone(&state.sessions),
    };
    let messages = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|response| (response, (rx, guard)))
    })
    .map(|response| {
        let data = serde_json::to_string(&response).unwrap_or_else(|e| {
            serde_json::to_string(&JsonRpcResponse::internal_error(
                response.id.clone(),
                e.to_string(),
            ))
            .unwrap_or_default()
        });
        Ok(Event::default().event("message").data(data))
    });

    Sse::new(stream::once(async move { Ok(endpoint) }).chain(messages))
        .keep_alive(KeepAlive::default())
}

#[instrument(skip_all)]
async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let sender = state.sessions.read().await.get(&query.session_id).cloned();
    let Some(sender) = sender else {
        warn!(session = %query.session_id, "Message for unknown session");
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Unknown session" })),
        )
            .into_response();
    };

    let response = match parse_request(&body) {
        Ok(request) => process_request(&state.server, request).await,
        Err(response) => Some(response),
    };

    if let Some(response) = response {
        if sender.send(response).await.is_err() {
            info!(session = %query.session_id, "Event stream closed, dropping session");
            state.sessions.write().await.remove(&query.session_id);
            return StatusCode::GONE.into_response();
        }
    }
    StatusCode::ACCEPTED.into_response()
}

// ============================================================================
// Dispatch
// ============================================================================

fn params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, JsonRpcResponse> {
    let params = request.params.clone().unwrap_or_else(|| json!({}));
    serde_json::from_value(params)
        .map_err(|e| JsonRpcResponse::invalid_params(request.id.clone(), e.to_string()))
}

fn to_response<T: Serialize>(
    id: Option<Value>,
    result: Result<T, McpError>,
) -> JsonRpcResponse {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
        },
        Err(e) => JsonRpcResponse::from_mcp(id, e),
    }
}

/// Handle one JSON-RPC message. Notifications produce no response.
pub async fn process_request(server: &McpServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(request.id));
    }
    if request.method.starts_with("notifications/") {
        debug!("Received notification: {}", request.method);
        return None;
    }
    info!("Received JSON-RPC request: {}", request.method);

    let id = request.id.clone();
    let handle = server.handle();
    let response = match request.method.as_str() {
        "initialize" => to_response(id, Ok(server.server_info())),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": handle.tools() })),
        "tools/call" => match params(&request) {
            Ok(call) => to_response(id, server.invoke_tool(call).await),
            Err(response) => response,
        },
        "resources/list" => {
            JsonRpcResponse::success(id, json!({ "resources": handle.resources() }))
        }
        "resources/templates/list" => JsonRpcResponse::success(
            id,
            json!({ "resourceTemplates": handle.resource_templates() }),
        ),
        "resources/read" => match params::<rmcp::model::ReadResourceRequestParam>(&request) {
            Ok(read) => to_response(id, server.fetch_resource(&read.uri).await),
            Err(response) => response,
        },
        "prompts/list" => JsonRpcResponse::success(id, json!({ "prompts": handle.prompts() })),
        "prompts/get" => match params::<rmcp::model::GetPromptRequestParam>(&request) {
            Ok(get) => to_response(id, server.render_prompt(&get.name, get.arguments)),
            Err(response) => response,
        },
        other => {
            warn!("Unknown method: {}", other);
            JsonRpcResponse::method_not_found(id, other)
        }
    };
    Some(response)
}
