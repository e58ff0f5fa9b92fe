//! Transport configuration types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// HTTP transport: JSON-RPC over POST plus an SSE event stream.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for the request/response JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Path clients GET to open an event stream.
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Path clients POST messages to for an open event stream.
    #[serde(default = "default_messages_path")]
    pub messages_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(feature = "http")]
fn default_port() -> u16 {
    8000
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_sse_path() -> String {
    "/sse".to_string()
}

#[cfg(feature = "http")]
fn default_messages_path() -> String {
    "/messages".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            rpc_path: default_rpc_path(),
            sse_path: default_sse_path(),
            messages_path: default_messages_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Build transport config from `MCP_TRANSPORT` and related variables.
    ///
    /// `http`, `sse` and `streamable-http` all select the HTTP transport,
    /// which serves both request/response and event-stream clients.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let transport = vars
            .get("MCP_TRANSPORT")
            .map(|t| t.to_lowercase())
            .unwrap_or_default();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "http" | "sse" | "streamable-http" => {
                let port = vars
                    .get("MCP_SERVER_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_port);
                let host = vars
                    .get("MCP_SERVER_HOST")
                    .cloned()
                    .unwrap_or_else(default_host);
                let rpc_path = vars
                    .get("MCP_HTTP_PATH")
                    .cloned()
                    .unwrap_or_else(default_rpc_path);
                let enable_cors = vars
                    .get("MCP_HTTP_CORS")
                    .map(|v| v.to_lowercase() != "false" && v != "0")
                    .unwrap_or(true);
                Self::Http(HttpConfig {
                    port,
                    host,
                    rpc_path,
                    enable_cors,
                    ..Default::default()
                })
            }
            _ => Self::default(),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!(
                "HTTP on {}:{} (rpc {}, sse {})",
                cfg.host, cfg.port, cfg.rpc_path, cfg.sse_path
            ),
        }
    }

    /// Short transport name, as accepted by `MCP_TRANSPORT`.
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "stdio",
            #[cfg(feature = "http")]
            Self::Http(_) => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_default_is_stdio() {
        let config = TransportConfig::from_vars(&vars(&[]));
        assert_eq!(config.kind(), "stdio");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_sse_selects_http() {
        let config = TransportConfig::from_vars(&vars(&[
            ("MCP_TRANSPORT", "SSE"),
            ("MCP_SERVER_PORT", "9100"),
            ("MCP_SERVER_HOST", "127.0.0.1"),
        ]));
        match config {
            TransportConfig::Http(cfg) => {
                assert_eq!(cfg.port, 9100);
                assert_eq!(cfg.host, "127.0.0.1");
                assert_eq!(cfg.sse_path, "/sse");
                assert!(cfg.enable_cors);
            }
            #[allow(unreachable_patterns)]
            _ => panic!("expected HTTP transport"),
        }
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_invalid_port_falls_back() {
        let config = TransportConfig::from_vars(&vars(&[
            ("MCP_TRANSPORT", "http"),
            ("MCP_SERVER_PORT", "not-a-port"),
            ("MCP_HTTP_CORS", "false"),
        ]));
        match config {
            TransportConfig::Http(cfg) => {
                assert_eq!(cfg.port, 8000);
                assert_eq!(cfg.host, "0.0.0.0");
                assert!(!cfg.enable_cors);
            }
            #[allow(unreachable_patterns)]
            _ => panic!("expected HTTP transport"),
        }
    }
}
