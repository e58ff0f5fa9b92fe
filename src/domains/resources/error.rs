//! Resource-specific error types.

use thiserror::Error;

/// Errors that can occur during resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No resource or template matches the URI.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A URI or URI template is malformed.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// A template parameter the handler needs was not captured.
    #[error("Missing URI parameter: {0}")]
    MissingParameter(String),

    /// An I/O error occurred while producing the content.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResourceError {
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::NotFound(uri.into())
    }

    pub fn invalid_uri(msg: impl Into<String>) -> Self {
        Self::InvalidUri(msg.into())
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
