//! Bookkeeping for discovered registration units.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of capability a unit directory contributes.
///
/// The category only classifies units for logging and catalog lookup; the
/// loader treats every category the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tool,
    Resource,
    Prompt,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a unit: `"{directory}.{stem}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    directory: String,
    stem: String,
}

impl UnitId {
    pub fn new(directory: impl Into<String>, stem: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            stem: stem.into(),
        }
    }

    /// Derive the identifier for `file` inside the unit directory `dir`.
    ///
    /// The directory part is the final component of `dir`, so `./tools` and
    /// `/srv/app/tools` both yield `tools.<stem>`.
    pub fn from_path(dir: &Path, file: &Path) -> Option<Self> {
        let stem = file.file_stem()?.to_str()?;
        let directory = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| dir.display().to_string());
        Some(Self::new(directory, stem))
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.directory, self.stem)
    }
}

/// Load state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Pending,
    Loaded,
    Failed,
}

/// One discovered unit file and what became of it.
#[derive(Debug, Clone)]
pub struct RegistrationUnit {
    pub id: UnitId,
    pub category: Category,
    pub path: PathBuf,
    pub status: UnitStatus,
    pub error: Option<String>,
}

impl RegistrationUnit {
    pub fn pending(id: UnitId, category: Category, path: PathBuf) -> Self {
        Self {
            id,
            category,
            path,
            status: UnitStatus::Pending,
            error: None,
        }
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.status = UnitStatus::Loaded;
        self.error = None;
    }

    pub(crate) fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = UnitStatus::Failed;
        self.error = Some(error.into());
    }
}
