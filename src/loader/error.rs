//! Loader error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::handle::RegistrationError;

/// Errors a unit may return from its import function or its hook.
#[derive(Debug, Error)]
pub enum UnitError {
    /// The handle rejected a registration.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A descriptor setting was present but unusable.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// A credential listed in `requires` is not configured.
    #[error("Missing credential '{0}'")]
    MissingCredential(String),

    /// Any other unit-specific failure.
    #[error("{0}")]
    Other(String),
}

impl UnitError {
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Why a directory or unit failed to load. Logged, never propagated.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A configured unit directory is absent.
    #[error("Directory {} does not exist", .0.display())]
    DirectoryMissing(PathBuf),

    /// A configured unit directory exists but cannot be listed.
    #[error("Directory {} is unreadable ({:?}): {source}", .path.display(), .source.kind())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The unit could not be imported.
    #[error("import failed: {0}")]
    Import(String),

    /// The unit's register hook returned an error or panicked.
    #[error("register hook failed: {0}")]
    Hook(String),
}
