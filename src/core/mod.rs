//! Core infrastructure: configuration, errors, the server handle units
//! register against, the MCP server handler and its transports.

pub mod cache;
pub mod config;
pub mod error;
pub mod handle;
pub mod server;
pub mod transport;

pub use cache::{CacheStats, TtlCache};
pub use config::Config;
pub use error::{Error, Result};
pub use handle::{RegistrationError, ServerHandle};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
