//! Tool-specific error types.

use thiserror::Error;

/// Errors that can occur while dispatching or executing a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under this name.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Arguments did not match the tool's parameters.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran and reported a failure.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// An internal error occurred, such as an unserializable result.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
