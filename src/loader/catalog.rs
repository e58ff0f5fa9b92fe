//! The unit catalog: every unit the binary knows how to import.
//!
//! Descriptor files on disk choose *which* units are active; the catalog is
//! the statically linked table that maps a descriptor's entry name to the
//! function that builds the unit. Adding a unit means writing it under
//! `domains/` and listing it in [`Catalog::builtin`].

use std::collections::HashMap;
use std::sync::Arc;

use super::error::UnitError;
use super::record::Category;
use super::unit::{ImportContext, Unit};
use crate::domains::prompts::definitions::{GreetingUnit, SummarizeUnit};
use crate::domains::resources::definitions::{ExampleResourcesUnit, ServerInfoUnit};
use crate::domains::tools::definitions::ExampleToolsUnit;

/// Builds a unit from its import context.
pub type ImportFn =
    Arc<dyn Fn(&ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> + Send + Sync>;

/// Table of importable units keyed by category and entry name.
#[derive(Clone, Default)]
pub struct Catalog {
    entries: HashMap<(Category, String), ImportFn>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The units compiled into this server.
    pub fn builtin() -> Self {
        Self::new()
            .with(Category::Tool, ExampleToolsUnit::ENTRY, ExampleToolsUnit::import)
            .with(
                Category::Resource,
                ExampleResourcesUnit::ENTRY,
                ExampleResourcesUnit::import,
            )
            .with(Category::Resource, ServerInfoUnit::ENTRY, ServerInfoUnit::import)
            .with(Category::Prompt, GreetingUnit::ENTRY, GreetingUnit::import)
            .with(Category::Prompt, SummarizeUnit::ENTRY, SummarizeUnit::import)
    }

    /// Add an entry, replacing any previous one with the same key.
    pub fn with<F>(mut self, category: Category, entry: impl Into<String>, import: F) -> Self
    where
        F: Fn(&ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> + Send + Sync + 'static,
    {
        self.insert(category, entry, import);
        self
    }

    pub fn insert<F>(&mut self, category: Category, entry: impl Into<String>, import: F)
    where
        F: Fn(&ImportContext<'_>) -> Result<Box<dyn Unit>, UnitError> + Send + Sync + 'static,
    {
        self.entries.insert((category, entry.into()), Arc::new(import));
    }

    pub fn get(&self, category: Category, entry: &str) -> Option<ImportFn> {
        self.entries.get(&(category, entry.to_string())).cloned()
    }

    pub fn contains(&self, category: Category, entry: &str) -> bool {
        self.entries.contains_key(&(category, entry.to_string()))
    }

    /// Entry names registered for `category`, sorted.
    pub fn entries(&self, category: Category) -> Vec<&str> {
        let mut names: Vec<_> = self
            .entries
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, name)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
