//! Unit descriptor files.
//!
//! Each `*.toml` file in a unit directory describes one unit:
//!
//! ```toml
//! # tools/bmi.toml
//! entry = "example"            # catalog entry; defaults to the file stem
//! requires = ["weather_key"]   # credentials that must be configured
//!
//! [settings]                   # handed to the unit's import function
//! cache_ttl_secs = 300
//! ```
//!
//! An empty file is a valid descriptor.

use serde::Deserialize;

/// File extension of unit descriptors.
pub const DESCRIPTOR_EXTENSION: &str = "toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitDescriptor {
    pub entry: Option<String>,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub settings: toml::Table,
}

impl UnitDescriptor {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Catalog entry to instantiate, falling back to the file stem.
    pub fn entry_or<'a>(&'a self, stem: &'a str) -> &'a str {
        self.entry.as_deref().unwrap_or(stem)
    }
}
