//! Transport error types.

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that end a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The MCP session could not be established.
    #[error("Server initialization error: {0}")]
    InitError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The rmcp service stopped with an error.
    #[error("Service error: {0}")]
    ServiceError(String),
}

impl TransportError {
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    pub fn init(msg: impl Into<String>) -> Self {
        Self::InitError(msg.into())
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::HttpError(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::ServiceError(msg.into())
    }
}
