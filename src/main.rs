//! Dynamic MCP server entry point.
//!
//! Loads configuration, initializes logging, then loads the unit directories
//! and serves them over the configured transport.

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use dynamic_mcp_server::core::{Config, config::LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    init_logging(&config.logging);

    info!("Starting {} v{}", config.server.name, config.server.version);

    dynamic_mcp_server::serve(config).await?;

    info!("Server shutting down");
    Ok(())
}

/// Logs go to stderr so they never mix with the STDIO transport.
fn init_logging(logging: &LoggingConfig) {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
