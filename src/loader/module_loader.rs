//! Discovers unit descriptors on disk and registers their units.

use std::any::Any;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument, warn};

use super::catalog::Catalog;
use super::descriptor::{DESCRIPTOR_EXTENSION, UnitDescriptor};
use super::error::LoadError;
use super::record::{Category, RegistrationUnit, UnitId};
use super::unit::{ImportContext, Unit};
use crate::core::handle::ServerHandle;

/// Outcome of one [`ModuleLoader::load`] pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Units imported and registered in this pass.
    pub loaded: Vec<UnitId>,
    /// Units that failed, with the reason.
    pub failed: Vec<(UnitId, String)>,
    /// Units already attempted by an earlier pass.
    pub skipped: Vec<UnitId>,
    /// Configured directories that do not exist or cannot be listed.
    pub missing_directories: Vec<PathBuf>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.missing_directories.is_empty()
    }
}

/// Walks unit directories and activates every unit it finds.
///
/// Each unit file is attempted at most once per loader: a second `load` over
/// the same directories skips files it has already seen, whether they loaded
/// or failed. Failures are logged and recorded, never propagated.
pub struct ModuleLoader {
    catalog: Catalog,
    seen: HashSet<PathBuf>,
    units: Vec<RegistrationUnit>,
}

impl ModuleLoader {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            seen: HashSet::new(),
            units: Vec::new(),
        }
    }

    /// A loader over the units compiled into this server.
    pub fn with_builtin_catalog() -> Self {
        Self::new(Catalog::builtin())
    }

    /// Every unit attempted so far, in load order.
    pub fn units(&self) -> &[RegistrationUnit] {
        &self.units
    }

    /// Load every unit under `directories`, in the order given.
    #[instrument(skip_all, fields(directories = directories.len()))]
    pub fn load(
        &mut self,
        directories: &[(PathBuf, Category)],
        handle: &mut ServerHandle,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        for (dir, category) in directories {
            self.load_directory(dir, *category, handle, &mut report);
        }

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Module loading finished"
        );
        report
    }

    fn load_directory(
        &mut self,
        dir: &Path,
        category: Category,
        handle: &mut ServerHandle,
        report: &mut LoadReport,
    ) {
        let files = match descriptor_files(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("{}", e);
                report.missing_directories.push(dir.to_path_buf());
                return;
            }
        };
        debug!(dir = %dir.display(), %category, count = files.len(), "Scanning unit directory");

        for path in files {
            let Some(id) = UnitId::from_path(dir, &path) else {
                warn!(path = %path.display(), "Skipping file with a non UTF-8 name");
                continue;
            };

            let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !self.seen.insert(key) {
                debug!(unit = %id, "Unit already attempted, skipping");
                report.skipped.push(id);
                continue;
            }
            if let Some(earlier) = self.units.iter().find(|u| u.id == id) {
                warn!(
                    unit = %id,
                    path = %path.display(),
                    earlier = %earlier.path.display(),
                    "Unit identifier already used by another file"
                );
            }

            let mut unit = RegistrationUnit::pending(id.clone(), category, path);
            match self.activate(&unit, handle) {
                Ok(()) => {
                    info!("Successfully loaded {}: {}", category, id);
                    unit.mark_loaded();
                    report.loaded.push(id);
                }
                Err(e) => {
                    error!("Failed to load {} {}: {}", category, id, e);
                    unit.mark_failed(e.to_string());
                    report.failed.push((id, e.to_string()));
                }
            }
            self.units.push(unit);
        }
    }

    /// Import one unit and run its hook.
    fn activate(
        &self,
        unit: &RegistrationUnit,
        handle: &mut ServerHandle,
    ) -> Result<(), LoadError> {
        let loaded = self.import(unit, handle)?;

        match catch_unwind(AssertUnwindSafe(|| loaded.register(handle))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LoadError::Hook(e.to_string())),
            Err(panic) => Err(LoadError::Hook(panic_message(panic))),
        }
    }

    fn import(
        &self,
        unit: &RegistrationUnit,
        handle: &ServerHandle,
    ) -> Result<Box<dyn Unit>, LoadError> {
        let text = fs::read_to_string(&unit.path)
            .map_err(|e| LoadError::Import(format!("cannot read {}: {}", unit.path.display(), e)))?;
        let descriptor = UnitDescriptor::parse(&text)
            .map_err(|e| LoadError::Import(format!("invalid descriptor: {}", e)))?;

        let entry = descriptor.entry_or(unit.id.stem());
        let import = self.catalog.get(unit.category, entry).ok_or_else(|| {
            LoadError::Import(format!("no {} unit named '{}'", unit.category, entry))
        })?;

        let config = handle.config();
        if let Some(missing) = descriptor
            .requires
            .iter()
            .find(|name| !config.credentials.contains(name))
        {
            return Err(LoadError::Import(format!("missing credential '{}'", missing)));
        }

        let ctx = ImportContext {
            id: &unit.id,
            category: unit.category,
            settings: &descriptor.settings,
            config,
        };
        match catch_unwind(AssertUnwindSafe(|| import(&ctx))) {
            Ok(Ok(loaded)) => Ok(loaded),
            Ok(Err(e)) => Err(LoadError::Import(e.to_string())),
            Err(panic) => Err(LoadError::Import(panic_message(panic))),
        }
    }
}

/// Descriptor files directly inside `dir`, sorted by name.
fn descriptor_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::DirectoryMissing(dir.to_path_buf()),
        _ => LoadError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        },
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == DESCRIPTOR_EXTENSION)
        })
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
