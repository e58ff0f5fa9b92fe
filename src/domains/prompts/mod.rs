//! Prompts domain module.
//!
//! Prompts are message templates clients render with named arguments.
//!
//! ## Architecture
//!
//! - `templates.rs` - [`PromptTemplate`] and its renderer
//! - `definitions/` - Built-in prompt units
//! - `error.rs` - Prompt-specific error types

pub mod definitions;
mod error;
pub mod templates;

pub use definitions::PromptDefinition;
pub use error::PromptError;
pub use templates::{PromptTemplate, PromptTemplateBuilder};
