use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::ConfigError;
use crate::instance::{InstanceError, Multiton};

/// Name of the section holding constants. Matched case-insensitively.
pub(crate) const CONSTANTS_SECTION: &str = "constants";

static INSTANCES: Multiton<Conf> = Multiton::new();

/// Merged and resolved configuration.
///
/// Holds the `[constants]` section as a flat map of constants and every other
/// section as a table. Layout constants (`APP_ROOT`, `DS`, ...) are kept
/// alongside, so [`constant`](Self::constant) answers for both.
///
/// ## Example
///
/// ```no_run
/// use bluewater::{Config, Layout};
///
/// let layout = Layout::new("/srv/site");
/// let conf = Config::for_layout(&layout).build()?;
///
/// let tz = conf.get_str("general", "tz");
/// let log_path = conf.constant("LOG_PATH");
/// # Ok::<(), bluewater::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conf {
    constants: Table,
    sections: Table,
    layout: Table,
}

impl Conf {
    pub(crate) fn new(constants: Table, sections: Table, layout: Table) -> Self {
        Self {
            constants,
            sections,
            layout,
        }
    }

    /// Returns the process-wide configuration registered under `key`,
    /// building it with `init` on first access.
    pub fn instance<F>(key: &str, init: F) -> Result<Arc<Conf>, InstanceError>
    where
        F: FnOnce() -> Result<Conf, ConfigError>,
    {
        INSTANCES.get_or_try_init(key, init)
    }

    /// Drops the process-wide configuration registered under `key`.
    pub fn forget(key: &str) -> Option<Arc<Conf>> {
        INSTANCES.remove(key)
    }

    /// Looks up `key` in `section`.
    pub fn config(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section)?.get(key)
    }

    pub fn section(&self, name: &str) -> Option<&Table> {
        self.sections.get(name)?.as_table()
    }

    /// Looks up a constant, falling back to the layout constants.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name).or_else(|| self.layout.get(name))
    }

    /// Constants defined by configuration files (layout constants excluded).
    pub fn constants(&self) -> &Table {
        &self.constants
    }

    pub fn sections(&self) -> &Table {
        &self.sections
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.config(section, key)?.as_str()
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.config(section, key)?.as_bool()
    }

    pub fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        self.config(section, key)?.as_integer()
    }

    /// Deserializes one section into `T`.
    pub fn section_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        let section = self
            .sections
            .get(name)
            .ok_or_else(|| ConfigError::MissingSection(name.to_string()))?;
        section.clone().try_into().map_err(ConfigError::DeserializeError)
    }

    /// Deserializes all sections into `T`. The constants section is not included.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Value::Table(self.sections.clone())
            .try_into()
            .map_err(ConfigError::DeserializeError)
    }
}
