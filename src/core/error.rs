//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type that can represent errors from
//! all domains, the server handle, configuration and the transport.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Error originating from the resources domain.
    #[error("Resource error: {0}")]
    Resource(#[from] crate::domains::resources::ResourceError),

    /// Error originating from the prompts domain.
    #[error("Prompt error: {0}")]
    Prompt(#[from] crate::domains::prompts::PromptError),

    /// A registration was rejected by the server handle.
    #[error("Registration error: {0}")]
    Registration(#[from] super::handle::RegistrationError),

    /// The transport failed to start or stopped with an error.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ToolError;

    #[test]
    fn test_domain_errors_convert() {
        let err: Error = ToolError::not_found("double").into();
        assert_eq!(err.to_string(), "Tool error: Tool not found: double");
    }

    #[test]
    fn test_config_error_message() {
        let err = Error::config("MCP_SERVER_PORT must be a number");
        assert!(err.to_string().contains("MCP_SERVER_PORT"));
    }
}
