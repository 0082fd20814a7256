use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::{debug, warn};

use super::conf::CONSTANTS_SECTION;
use super::dir::DirSource;
use super::env::EnvSource;
use super::file::FileSource;
use super::resolve::resolve_references;
use super::source::{deep_merge, merge_at_path, ConfigSource};
use super::{Conf, ConfigError};
use crate::layout::Layout;

/// A configuration source in the loading pipeline.
#[derive(Debug)]
enum SourceSpec {
    Dir { path: PathBuf, required: bool },
    File { path: PathBuf, required: bool },
    Env { prefix: String, separator: String },
    Custom(Box<dyn ConfigSource>),
}

/// Builder for loading configuration from INI directories and files.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely.
///
/// ## Constants
///
/// The `[constants]` section is split out of the merged result. String
/// values anywhere may reference constants with `{NAME}`:
///
/// ```ini
/// [constants]
/// LOG_PATH      = {CACHE_ROOT}{DS}logs
/// ERR_FILE_PATH = {LOG_PATH}{DS}php_errors.log
/// ```
///
/// Layout constants passed via [`with_constants`](Self::with_constants) are
/// also visible to references, and configuration cannot redefine them.
///
/// ## Example
///
/// ```no_run
/// use bluewater::{Config, Layout};
///
/// let layout = Layout::new("/srv/site");
/// let conf = Config::builder()
///     .with_constants(layout.constants())
///     .with_dir(layout.framework_config_dir(), true)
///     .with_dir(layout.app_config_dir(), false)
///     .with_env("BW", "__")
///     .build()?;
/// # Ok::<(), bluewater::ConfigError>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<SourceSpec>,
    constants: Table,
    cache: bool,
    allow_unresolved: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            constants: Table::new(),
            cache: true,
            allow_unresolved: false,
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// The standard two-directory setup for a site: framework config
    /// (required), then application config (optional), with the layout's
    /// path constants.
    pub fn for_layout(layout: &Layout) -> Self {
        Self::builder()
            .with_constants(layout.constants())
            .with_dir(layout.framework_config_dir(), true)
            .with_dir(layout.app_config_dir(), false)
    }

    /// Adds a directory whose `*.ini.php` files are loaded.
    ///
    /// If `required` is `true`, the build will fail if the directory doesn't exist.
    pub fn with_dir(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(SourceSpec::Dir {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds a single INI file.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(SourceSpec::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Loads overrides from environment variables with the given prefix.
    ///
    /// `BW__GENERAL__TZ=UTC` (prefix `BW`, separator `__`) sets `[general] tz`.
    /// Values are coerced like unquoted INI values.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.sources.push(SourceSpec::Env {
            prefix: prefix.into(),
            separator: separator.into(),
        });
        self
    }

    /// Adds a custom source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(SourceSpec::Custom(Box::new(source)));
        self
    }

    /// Adds fixed constants (usually [`Layout::constants`]).
    pub fn with_constants(mut self, constants: Table) -> Self {
        for (name, value) in constants {
            self.constants.insert(name, value);
        }
        self
    }

    /// Enables or disables the per-directory cache. Enabled by default.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Keeps unknown `{NAME}` references as literal text instead of failing.
    pub fn allow_unresolved(mut self, allow: bool) -> Self {
        self.allow_unresolved = allow;
        self
    }

    /// Builds the configuration by loading, merging and resolving all sources.
    pub fn build(self) -> Result<Conf, ConfigError> {
        let mut merged = Table::new();

        for spec in self.sources {
            let source: Box<dyn ConfigSource> = match spec {
                SourceSpec::Dir { path, required } => {
                    Box::new(DirSource::new(path, required).with_cache(self.cache))
                }
                SourceSpec::File { path, required } => Box::new(FileSource::new(path, required)),
                SourceSpec::Env { prefix, separator } => {
                    Box::new(EnvSource::new(prefix, separator))
                }
                SourceSpec::Custom(source) => source,
            };
            for entry in source.entries()? {
                merge_at_path(&mut merged, &entry.path, entry.value);
            }
        }

        let mut constants = take_constants(&mut merged);
        let shadowed: Vec<String> = constants
            .keys()
            .filter(|name| self.constants.contains_key(name.as_str()))
            .cloned()
            .collect();
        for name in shadowed {
            warn!(constant = %name, "config cannot redefine a layout constant; ignoring it");
            constants.remove(&name);
        }

        resolve_references(
            &mut constants,
            &mut merged,
            &self.constants,
            self.allow_unresolved,
        )?;
        debug!(
            constants = constants.len(),
            sections = merged.len(),
            "configuration built"
        );

        Ok(Conf::new(constants, merged, self.constants))
    }

    /// Builds and deserializes the sections into `T`.
    pub fn build_as<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        self.build()?.deserialize()
    }
}

/// Removes every section named `constants` (in any case) and merges them.
fn take_constants(sections: &mut Table) -> Table {
    let names: Vec<String> = sections
        .keys()
        .filter(|name| name.eq_ignore_ascii_case(CONSTANTS_SECTION))
        .cloned()
        .collect();

    let mut constants = Table::new();
    for name in names {
        match sections.remove(&name) {
            Some(Value::Table(table)) => deep_merge(&mut constants, table),
            Some(_) => warn!(section = %name, "constants section is not a table; ignoring it"),
            None => {}
        }
    }
    constants
}
