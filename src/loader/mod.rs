//! Module loading: turns the unit directories into registrations.
//!
//! The loader scans each configured directory (tools, then resources, then
//! prompts), imports every unit it finds through the [`Catalog`] and calls
//! the unit's [`Unit::register`] hook against the shared
//! [`ServerHandle`](crate::core::handle::ServerHandle). One bad unit never
//! stops the others.

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod module_loader;
pub mod record;
pub mod unit;

pub use catalog::{Catalog, ImportFn};
pub use descriptor::{DESCRIPTOR_EXTENSION, UnitDescriptor};
pub use error::{LoadError, UnitError};
pub use module_loader::{LoadReport, ModuleLoader};
pub use record::{Category, RegistrationUnit, UnitId, UnitStatus};
pub use unit::{ImportContext, Unit};
