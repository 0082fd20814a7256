//! Directory scanning.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::FsError;

/// Suffix of raw configuration files.
pub const INI_PHP_SUFFIX: &str = ".ini.php";

/// Suffix of serialized (cached) configuration files.
pub const INI_SUFFIX: &str = ".ini";

/// Reads the file listing of a single directory tree.
///
/// The directory is validated and canonicalized on construction, so a
/// `DirectoryReader` always points at an existing, readable directory
/// (as of the time it was created).
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    directory: PathBuf,
}

impl DirectoryReader {
    /// Opens `directory` for scanning.
    ///
    /// Fails if the path does not exist, is not a directory, or cannot be listed.
    pub fn new(directory: impl AsRef<Path>) -> Result<Self, FsError> {
        Ok(Self {
            directory: check_dir(directory)?,
        })
    }

    /// The canonical path of the directory.
    pub fn path(&self) -> &Path {
        &self.directory
    }

    /// Returns regular files whose name ends with one of `suffixes`.
    ///
    /// An empty suffix list matches every file. When `include_subdirectories`
    /// is false only the top level is listed. Results are ordered by path.
    pub fn files(
        &self,
        suffixes: &[&str],
        include_subdirectories: bool,
    ) -> Result<Vec<PathBuf>, FsError> {
        let mut walker = WalkDir::new(&self.directory)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        if !include_subdirectories {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| FsError::Walk {
                path: self.directory.clone(),
                source,
            })?;
            if entry.file_type().is_file() && has_suffix(entry.file_name(), suffixes) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// The first `*.ini` file at the top level, if any.
    pub fn ini_file(&self) -> Result<Option<PathBuf>, FsError> {
        Ok(self.files(&[INI_SUFFIX], false)?.into_iter().next())
    }

    /// All raw `*.ini.php` files at the top level.
    pub fn ini_php_files(&self) -> Result<Vec<PathBuf>, FsError> {
        self.files(&[INI_PHP_SUFFIX], false)
    }
}

fn has_suffix(name: &OsStr, suffixes: &[&str]) -> bool {
    if suffixes.is_empty() {
        return true;
    }
    match name.to_str() {
        Some(name) => suffixes.iter().any(|suffix| name.ends_with(suffix)),
        None => false,
    }
}

/// Verifies that `path` is a listable directory and returns its canonical form.
pub fn check_dir(path: impl AsRef<Path>) -> Result<PathBuf, FsError> {
    let path = path.as_ref();
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FsError::DirNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(FsError::io(path, e)),
    };
    if !metadata.is_dir() {
        return Err(FsError::NotADirectory(path.to_path_buf()));
    }

    std::fs::read_dir(path).map_err(|source| FsError::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;

    path.canonicalize().map_err(|e| FsError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn config_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Bluewater.ini.php"), "").unwrap();
        fs::write(dir.path().join("BW.logging.ini.php"), "").unwrap();
        fs::write(dir.path().join("BW.session.php"), "").unwrap();
        fs::write(dir.path().join("Config.ini"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/Deep.ini.php"), "").unwrap();
        dir
    }

    #[test]
    fn test_missing_directory() {
        let result = DirectoryReader::new("/nonexistent/bluewater/Config");
        assert!(matches!(result, Err(FsError::DirNotFound(_))));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = config_dir();
        let result = DirectoryReader::new(dir.path().join("BW.session.php"));
        assert!(matches!(result, Err(FsError::NotADirectory(_))));
    }

    #[test]
    fn test_ini_php_files_skip_other_suffixes() {
        let dir = config_dir();
        let reader = DirectoryReader::new(dir.path()).unwrap();
        let files = reader.ini_php_files().unwrap();
        assert_eq!(names(&files), ["BW.logging.ini.php", "Bluewater.ini.php"]);
    }

    #[test]
    fn test_ini_file_does_not_match_ini_php() {
        let dir = config_dir();
        let reader = DirectoryReader::new(dir.path()).unwrap();
        let cache = reader.ini_file().unwrap().unwrap();
        assert_eq!(cache.file_name().unwrap(), "Config.ini");
    }

    #[test]
    fn test_subdirectories_are_opt_in() {
        let dir = config_dir();
        let reader = DirectoryReader::new(dir.path()).unwrap();

        let shallow = reader.files(&[INI_PHP_SUFFIX], false).unwrap();
        let deep = reader.files(&[INI_PHP_SUFFIX], true).unwrap();

        assert_eq!(shallow.len(), 2);
        assert_eq!(deep.len(), 3);
        assert!(names(&deep).contains(&"Deep.ini.php".to_string()));
    }

    #[test]
    fn test_no_suffix_lists_all_files() {
        let dir = config_dir();
        let reader = DirectoryReader::new(dir.path()).unwrap();
        assert_eq!(reader.files(&[], false).unwrap().len(), 4);
    }
}
