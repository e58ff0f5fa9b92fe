//! Resources domain module.
//!
//! Resources represent data MCP clients can read by URI. A resource is
//! registered either under a fixed URI or under a URI template such as
//! `users://{user_id}/profile`, whose variables reach the handler as
//! [`UriParams`].
//!
//! ## Architecture
//!
//! - `handlers.rs` - The [`ResourceHandler`] trait and closure adapter
//! - `templates.rs` - URI template parsing and matching
//! - `definitions/` - Built-in resource units
//! - `error.rs` - Resource-specific error types

pub mod definitions;
mod error;
mod handlers;
mod templates;

pub use error::ResourceError;
pub use handlers::*;
pub use templates::{UriParams, UriTemplate};
