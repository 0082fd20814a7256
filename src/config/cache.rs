//! Serialized per-directory config cache.
//!
//! Parsing every `*.ini.php` file on each boot is wasteful, so a config
//! directory keeps its merged raw table in `<Dir>/<Dir>.ini` (serialized as
//! TOML). The cache holds values *before* constant substitution, so it stays
//! valid when the site moves. It also records the names of the files it was
//! built from, so adding or removing a source invalidates it.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use toml::Table;
use tracing::{debug, info};

use super::ConfigError;
use crate::fs::{load_file, FileHandler, INI_SUFFIX};

const HEADER: &str = "# Generated config cache. Delete this file to rebuild it.\n";

/// Contents of a cache file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cached {
    /// File names of the sources, in merge order.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub config: Table,
}

impl Cached {
    pub fn new(sources: &[PathBuf], config: Table) -> Self {
        Self {
            sources: file_names(sources),
            config,
        }
    }

    /// True if the cache was built from exactly these files.
    pub fn built_from(&self, sources: &[PathBuf]) -> bool {
        self.sources == file_names(sources)
    }
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

/// Cache path for `dir`: `dir/<basename of dir>.ini`.
pub fn cache_path(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    dir.join(format!("{name}{INI_SUFFIX}"))
}

/// True if `cache` exists and is at least as new as every file in `sources`.
pub fn is_fresh(cache: &Path, sources: &[PathBuf]) -> bool {
    let Some(cached_at) = modified(cache) else {
        return false;
    };
    sources
        .iter()
        .all(|source| modified(source).is_some_and(|at| at <= cached_at))
}

fn modified(path: &Path) -> Option<SystemTime> {
    FileHandler::open(path).ok()?.metadata().ok()?.modified
}

pub fn read(cache: &Path) -> Result<Cached, ConfigError> {
    let contents = load_file(cache)?;
    let cached = toml::from_str(&contents).map_err(|e| ConfigError::CacheParseError {
        path: cache.to_path_buf(),
        source: e,
    })?;
    debug!(path = %cache.display(), "loaded config cache");
    Ok(cached)
}

pub fn write(cache: &Path, cached: &Cached) -> Result<(), ConfigError> {
    let body = toml::to_string(cached)?;
    FileHandler::create(cache)?.write(&format!("{HEADER}{body}"))?;
    info!(path = %cache.display(), sources = cached.sources.len(), "wrote config cache");
    Ok(())
}

/// Removes the cache file of `dir`, if present. Returns whether one was removed.
///
/// Other `*.ini` files in the directory are left alone.
pub fn clear(dir: impl AsRef<Path>) -> Result<bool, ConfigError> {
    let cache = cache_path(dir.as_ref());
    match FileHandler::open(&cache) {
        Ok(handler) => {
            handler.delete()?;
            info!(path = %cache.display(), "removed config cache");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
