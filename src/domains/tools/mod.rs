//! Tools domain module.
//!
//! Tools are executable functions that MCP clients call with JSON arguments.
//!
//! ## Architecture
//!
//! - `handlers.rs` - The [`ToolHandler`] trait, typed adapters and result caching
//! - `definitions/` - Built-in tool units, one file per unit
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a unit in `definitions/` whose `register` hook calls
//!    `ServerHandle::add_tool`
//! 2. List it in `Catalog::builtin`
//! 3. Drop a descriptor file named after it into the tools directory

pub mod definitions;
mod error;
mod handlers;

pub use error::ToolError;
pub use handlers::*;
