//! Single INI file source, for overrides outside the config directories.

use std::path::{Path, PathBuf};

use toml::Table;
use tracing::debug;

use super::ini;
use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;
use crate::fs::{load_file, FsError};

/// One INI file, guarded (`*.ini.php`) or plain.
///
/// An optional file that is absent contributes nothing.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let entries = load_ini_file(&self.path, self.required)?
            .map(ConfigEntry::root)
            .into_iter()
            .collect();
        Ok(entries)
    }
}

/// Reads and parses `path`; `None` when it is missing and not `required`.
pub(crate) fn load_ini_file(path: &Path, required: bool) -> Result<Option<Table>, ConfigError> {
    let contents = match load_file(path) {
        Ok(contents) => contents,
        Err(FsError::FileNotFound(_)) if !required => {
            debug!(path = %path.display(), "optional config file absent");
            return Ok(None);
        }
        Err(FsError::FileNotFound(_)) => return Err(ConfigError::FileNotFound(path.to_path_buf())),
        Err(e) => return Err(e.into()),
    };

    let sections = ini::parse(&contents).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), sections = sections.len(), "parsed config file");
    Ok(Some(sections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_guarded_file_becomes_root_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.ini.php");
        fs::write(&path, "<?php exit; ?>\n[db]\nhost = localhost\nport = 3306\n").unwrap();

        let entries = FileSource::new(&path, true).entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.is_empty());
        let db = &entries[0].value["db"];
        assert_eq!(db["host"].as_str(), Some("localhost"));
        assert_eq!(db["port"].as_integer(), Some(3306));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.ini.php");

        assert!(FileSource::new(&path, false).entries().unwrap().is_empty());
        assert!(matches!(
            FileSource::new(&path, true).entries(),
            Err(ConfigError::FileNotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_parse_error_names_file_and_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.ini");
        fs::write(&path, "[app]\nkey = 1\n[oops\n").unwrap();

        match FileSource::new(&path, true).entries() {
            Err(ConfigError::ParseError { path: p, source }) => {
                assert_eq!(p, path);
                assert_eq!(source.line, 3);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
