//! Dynamic MCP server library.
//!
//! A Model Context Protocol server whose capabilities are not wired into the
//! server itself. At startup the module loader scans the `tools`,
//! `resources` and `prompts` directories for unit descriptors, imports each
//! unit and lets its `register` hook add tools, resources and prompts to a
//! shared [`ServerHandle`](crate::core::ServerHandle). A unit that fails to load is
//! logged and skipped.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the server handle, the MCP handler and transports
//! - **loader**: directory scanning, the unit catalog and registration hooks
//! - **domains**: tool, resource and prompt plumbing plus the built-in units
//!
//! # Example
//!
//! ```rust,no_run
//! use dynamic_mcp_server::core::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     dynamic_mcp_server::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;
pub mod loader;

pub use crate::core::{Config, Error, McpServer, Result, ServerHandle};
pub use loader::{LoadReport, ModuleLoader};

use tracing::{info, warn};

use crate::core::TransportService;

/// Load every unit into a fresh handle.
pub fn build_handle(config: Config, loader: &mut ModuleLoader) -> (ServerHandle, LoadReport) {
    let directories = config.loader.directories();
    let mut handle = ServerHandle::new(config);
    let report = loader.load(&directories, &mut handle);
    (handle, report)
}

/// Load the built-in units from the configured directories and serve them
/// over the configured transport until it shuts down.
pub async fn serve(config: Config) -> Result<()> {
    config.validate()?;
    let transport = TransportService::new(config.transport.clone());

    let mut loader = ModuleLoader::with_builtin_catalog();
    let (handle, report) = build_handle(config, &mut loader);
    if !report.failed.is_empty() {
        warn!("{} unit(s) failed to load", report.failed.len());
    }
    info!(
        tools = handle.tools().len(),
        resources = handle.resources().len(),
        templates = handle.resource_templates().len(),
        prompts = handle.prompts().len(),
        "Server handle ready"
    );

    transport.run(McpServer::new(handle)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_handle_from_directories() {
        let root = TempDir::new().unwrap();
        let tools = root.path().join("tools");
        fs::create_dir(&tools).unwrap();
        fs::write(tools.join("example.toml"), "").unwrap();

        let mut config = Config::default();
        config.loader.tools_dir = tools;
        config.loader.resources_dir = root.path().join("resources");
        config.loader.prompts_dir = root.path().join("prompts");

        let mut loader = ModuleLoader::with_builtin_catalog();
        let (handle, report) = build_handle(config, &mut loader);

        assert_eq!(report.loaded.len(), 1);
        assert_eq!(report.missing_directories.len(), 2);
        assert_eq!(handle.tool_names(), vec!["calculate_bmi"]);
    }
}
