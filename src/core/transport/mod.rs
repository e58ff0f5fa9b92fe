//! Transport layer for the MCP server.
//!
//! - **STDIO**: standard input/output, the default MCP mode - feature: `stdio`
//! - **HTTP**: JSON-RPC over POST plus an SSE event stream - feature: `http`
//!
//! Both transports serve the same [`McpServer`](crate::core::McpServer);
//! `MCP_TRANSPORT` picks one at startup.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
