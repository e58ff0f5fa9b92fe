//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (optionally via a `.env` file) or defaults.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{Error, Result};
use super::transport::TransportConfig;
use crate::loader::Category;

/// Prefix for opaque per-unit credentials, e.g. `MCP_CREDENTIAL_WEATHER_KEY`.
const CREDENTIAL_PREFIX: &str = "MCP_CREDENTIAL_";

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Where the module loader looks for units.
    pub loader: LoaderConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Upstream API credentials, opaque to the loader.
    pub credentials: CredentialsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Unit directories scanned at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub tools_dir: PathBuf,
    pub resources_dir: PathBuf,
    pub prompts_dir: PathBuf,
}

impl LoaderConfig {
    /// Directories in load order: tools, then resources, then prompts.
    pub fn directories(&self) -> Vec<(PathBuf, Category)> {
        vec![
            (self.tools_dir.clone(), Category::Tool),
            (self.resources_dir.clone(), Category::Resource),
            (self.prompts_dir.clone(), Category::Prompt),
        ]
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            tools_dir: PathBuf::from("tools"),
            resources_dir: PathBuf::from("resources"),
            prompts_dir: PathBuf::from("prompts"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Credentials handed to units that declare them in `requires`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(skip_serializing)]
    values: BTreeMap<String, String>,
}

impl CredentialsConfig {
    /// Set a credential. Names are case-insensitive.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(name.as_ref().to_lowercase(), value.into());
    }

    /// Look up a credential by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.values.keys().map(|k| (k, "[REDACTED]")))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "dynamic-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            loader: LoaderConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Variables are prefixed with `MCP_`, e.g. `MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`, `MCP_TOOLS_DIR`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let mut config = Self::default();

        if let Some(name) = vars.get("MCP_SERVER_NAME") {
            config.server.name = name.clone();
        }

        if let Some(level) = vars.get("MCP_LOG_LEVEL").or_else(|| vars.get("LOG_LEVEL")) {
            config.logging.level = level.clone();
        }

        if let Some(ts) = vars.get("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = ts.to_lowercase() != "false" && ts != "0";
        }

        if let Some(dir) = vars.get("MCP_TOOLS_DIR") {
            config.loader.tools_dir = PathBuf::from(dir);
        }
        if let Some(dir) = vars.get("MCP_RESOURCES_DIR") {
            config.loader.resources_dir = PathBuf::from(dir);
        }
        if let Some(dir) = vars.get("MCP_PROMPTS_DIR") {
            config.loader.prompts_dir = PathBuf::from(dir);
        }

        config.transport = TransportConfig::from_vars(&vars);

        for (key, value) in &vars {
            if let Some(name) = key.strip_prefix(CREDENTIAL_PREFIX) {
                if name.is_empty() {
                    warn!("Ignoring credential variable with empty name: {}", key);
                    continue;
                }
                config.credentials.insert(name, value.clone());
            }
        }
        if !config.credentials.is_empty() {
            info!("Loaded {} credential(s) from environment", config.credentials.len());
        }

        config
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(Error::config("server name must not be empty"));
        }

        #[cfg(feature = "http")]
        if let TransportConfig::Http(http) = &self.transport {
            let paths = [&http.rpc_path, &http.sse_path, &http.messages_path];
            if let Some(bad) = paths.iter().find(|p| !p.starts_with('/')) {
                return Err(Error::config(format!("HTTP path '{}' must start with '/'", bad)));
            }
            if paths[0] == paths[1] || paths[0] == paths[2] || paths[1] == paths[2] {
                return Err(Error::config("HTTP rpc, sse and messages paths must differ"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new());
        assert_eq!(config.server.name, "dynamic-mcp");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.loader.tools_dir, PathBuf::from("tools"));
        assert!(config.credentials.is_empty());
    }

    #[test]
    fn test_directories_order() {
        let dirs = LoaderConfig::default().directories();
        let categories: Vec<_> = dirs.iter().map(|(_, c)| *c).collect();
        assert_eq!(
            categories,
            vec![Category::Tool, Category::Resource, Category::Prompt]
        );
    }

    #[test]
    fn test_overrides_from_vars() {
        let config = Config::from_vars(vars(&[
            ("MCP_SERVER_NAME", "ynu-mcp"),
            ("MCP_LOG_LEVEL", "debug"),
            ("MCP_TOOLS_DIR", "/opt/units/tools"),
            ("MCP_LOG_TIMESTAMPS", "false"),
        ]));
        assert_eq!(config.server.name, "ynu-mcp");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.with_timestamps);
        assert_eq!(config.loader.tools_dir, PathBuf::from("/opt/units/tools"));
        assert_eq!(config.loader.prompts_dir, PathBuf::from("prompts"));
    }

    #[test]
    fn test_plain_log_level_fallback() {
        let config = Config::from_vars(vars(&[("LOG_LEVEL", "warn")]));
        assert_eq!(config.logging.level, "warn");

        let config = Config::from_vars(vars(&[("LOG_LEVEL", "warn"), ("MCP_LOG_LEVEL", "trace")]));
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_credentials_from_vars() {
        let config = Config::from_vars(vars(&[
            ("MCP_CREDENTIAL_OPENWEATHER_API_KEY", "abc123"),
            ("MCP_CREDENTIAL_", "ignored"),
            ("OPENWEATHER_API_KEY", "not-a-credential"),
        ]));
        assert_eq!(config.credentials.len(), 1);
        assert_eq!(config.credentials.get("openweather_api_key"), Some("abc123"));
        assert!(config.credentials.contains("OPENWEATHER_API_KEY"));
    }

    #[test]
    fn test_credentials_from_process_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_CREDENTIAL_TEST_TOKEN", "secret_12345");
        }
        let config = Config::from_env();
        assert_eq!(config.credentials.get("test_token"), Some("secret_12345"));
        unsafe {
            std::env::remove_var("MCP_CREDENTIAL_TEST_TOKEN");
        }
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let mut creds = CredentialsConfig::default();
        creds.insert("app_secret", "super_secret_key");
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(debug_str.contains("app_secret"));
        assert!(!debug_str.contains("super_secret_key"));
    }

    #[test]
    fn test_credentials_never_serialized() {
        let mut config = Config::default();
        config.credentials.insert("app_secret", "super_secret_key");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super_secret_key"));
        assert!(!json.contains("app_secret"));
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.server.name = "  ".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_validate_http_paths() {
        let config = Config::from_vars(vars(&[
            ("MCP_TRANSPORT", "sse"),
            ("MCP_HTTP_PATH", "/sse"),
        ]));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
