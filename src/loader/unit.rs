//! The registration interface every unit implements.

use serde::de::DeserializeOwned;

use super::error::UnitError;
use super::record::{Category, UnitId};
use crate::core::config::Config;
use crate::core::handle::ServerHandle;

/// A loaded unit.
///
/// `register` is the unit's hook: it is called exactly once, right after the
/// unit is imported, and performs all of the unit's registrations. The
/// default does nothing, for units with nothing to register explicitly.
pub trait Unit {
    fn register(&self, _handle: &mut ServerHandle) -> Result<(), UnitError> {
        Ok(())
    }
}

/// What an import function gets to build its unit from.
pub struct ImportContext<'a> {
    pub id: &'a UnitId,
    pub category: Category,
    pub settings: &'a toml::Table,
    pub config: &'a Config,
}

impl ImportContext<'_> {
    /// Deserialize an optional entry of the descriptor's `[settings]` table.
    pub fn setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, UnitError> {
        match self.settings.get(key) {
            None => Ok(None),
            Some(value) => value
                .clone()
                .try_into()
                .map(Some)
                .map_err(|e: toml::de::Error| UnitError::invalid_setting(key, e.to_string())),
        }
    }

    /// Look up a configured credential.
    pub fn credential(&self, name: &str) -> Result<&str, UnitError> {
        self.config
            .credentials
            .get(name)
            .ok_or_else(|| UnitError::MissingCredential(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_lookup() {
        let id = UnitId::new("tools", "example");
        let settings: toml::Table = toml::from_str("cache_ttl_secs = 30\nlabel = 'x'").unwrap();
        let config = Config::default();
        let ctx = ImportContext {
            id: &id,
            category: Category::Tool,
            settings: &settings,
            config: &config,
        };

        assert_eq!(ctx.setting::<u64>("cache_ttl_secs").unwrap(), Some(30));
        assert_eq!(ctx.setting::<u64>("absent").unwrap(), None);
        assert!(matches!(
            ctx.setting::<u64>("label"),
            Err(UnitError::InvalidSetting { .. })
        ));
        assert!(matches!(
            ctx.credential("api_key"),
            Err(UnitError::MissingCredential(_))
        ));
    }
}
