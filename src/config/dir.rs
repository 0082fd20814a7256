//! Directory-based configuration source.

use std::path::{Path, PathBuf};

use toml::Table;
use tracing::{debug, info, warn};

use super::cache;
use super::file::load_ini_file;
use super::source::{deep_merge, ConfigEntry, ConfigSource};
use super::ConfigError;
use crate::fs::{DirectoryReader, FsError};

/// A configuration source that loads every `*.ini.php` file in a directory.
///
/// Files are merged in file-name order, later files overriding earlier ones.
/// With caching enabled, the merged result is stored in the directory's
/// cache file and reused until one of the raw files changes.
#[derive(Debug, Clone)]
pub struct DirSource {
    path: PathBuf,
    required: bool,
    cache: bool,
}

impl DirSource {
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
            cache: true,
        }
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }
}

impl ConfigSource for DirSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let reader = match DirectoryReader::new(&self.path) {
            Ok(reader) => reader,
            Err(FsError::DirNotFound(path)) => {
                if self.required {
                    return Err(ConfigError::DirNotFound(path));
                }
                debug!(path = %path.display(), "optional config directory not found");
                return Ok(vec![]);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(load_dir(&reader, self.cache)?
            .map(ConfigEntry::root)
            .into_iter()
            .collect())
    }
}

/// Loads one config directory, preferring a fresh cache over raw files.
///
/// A cache is reused only when it is newer than every source and was built
/// from the same set of files. Returns `None` when the directory holds
/// neither raw files nor a cache.
fn load_dir(reader: &DirectoryReader, use_cache: bool) -> Result<Option<Table>, ConfigError> {
    let sources = reader.ini_php_files()?;
    let cache_file = cache::cache_path(reader.path());

    if use_cache && cache::is_fresh(&cache_file, &sources) {
        match cache::read(&cache_file) {
            Ok(cached) if sources.is_empty() || cached.built_from(&sources) => {
                info!(path = %cache_file.display(), "using config cache");
                return Ok(Some(cached.config));
            }
            Ok(_) => {
                info!(path = %cache_file.display(), "config sources changed; rebuilding cache");
            }
            Err(e) if !sources.is_empty() => {
                warn!(error = %e, "ignoring unreadable config cache");
            }
            Err(e) => return Err(e),
        }
    }

    if sources.is_empty() {
        debug!(path = %reader.path().display(), "no config files in directory");
        return Ok(None);
    }

    let mut merged = Table::new();
    for path in &sources {
        if let Some(table) = load_ini_file(path, true)? {
            deep_merge(&mut merged, table);
        }
    }

    if use_cache {
        let cached = cache::Cached::new(&sources, merged);
        if let Err(e) = cache::write(&cache_file, &cached) {
            warn!(path = %cache_file.display(), error = %e, "failed to write config cache");
        }
        return Ok(Some(cached.config));
    }

    Ok(Some(merged))
}
