//! Tool, resource and prompt plumbing, plus the units built into the binary.
//!
//! Each domain exposes the handler types units register with and a
//! `definitions` module holding its built-in units.

pub mod prompts;
pub mod resources;
pub mod tools;
