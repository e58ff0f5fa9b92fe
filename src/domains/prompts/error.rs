//! Prompt-specific error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt not found: {0}")]
    NotFound(String),

    /// A required argument was not supplied.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// The template text is malformed.
    #[error("Template error: {0}")]
    TemplateError(String),
}

impl PromptError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn missing_argument(arg: impl Into<String>) -> Self {
        Self::MissingArgument(arg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::TemplateError(msg.into())
    }
}
