use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::FsError;

/// Snapshot of a file's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size: u64,
    pub is_file: bool,
    pub readonly: bool,
    pub executable: bool,
    pub modified: Option<SystemTime>,
}

/// Operations on a single existing file.
#[derive(Debug, Clone)]
pub struct FileHandler {
    path: PathBuf,
}

impl FileHandler {
    /// Opens a handler for an existing file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FsError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FsError::FileNotFound(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Creates (or truncates) the file and opens a handler for it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, FsError> {
        let path = path.as_ref();
        fs::File::create(path).map_err(|e| FsError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Creates an empty, uniquely named file in the system temp directory.
    ///
    /// The file is not removed automatically; call [`delete`](Self::delete).
    pub fn create_temp_file(prefix: &str) -> Result<Self, FsError> {
        Self::create_temp_file_in(std::env::temp_dir(), prefix)
    }

    /// Like [`create_temp_file`](Self::create_temp_file), inside `dir`.
    pub fn create_temp_file_in(dir: impl AsRef<Path>, prefix: &str) -> Result<Self, FsError> {
        let dir = dir.as_ref();
        let (_, path) = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(dir)
            .map_err(|e| FsError::io(dir, e))?
            .keep()
            .map_err(|e| FsError::io(dir, e.error))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<String, FsError> {
        load_file(&self.path)
    }

    /// Replaces the file contents.
    pub fn write(&self, content: &str) -> Result<(), FsError> {
        fs::write(&self.path, content).map_err(|e| FsError::io(&self.path, e))
    }

    pub fn append(&self, content: &str) -> Result<(), FsError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| FsError::io(&self.path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| FsError::io(&self.path, e))
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// True if any execute permission bit is set.
    pub fn is_executable(&self) -> bool {
        fs::metadata(&self.path).is_ok_and(|metadata| is_executable(&metadata))
    }

    pub fn delete(self) -> Result<(), FsError> {
        fs::remove_file(&self.path).map_err(|e| FsError::io(&self.path, e))
    }

    /// Copies the file and returns a handler for the copy.
    pub fn copy_to(&self, destination: impl AsRef<Path>) -> Result<FileHandler, FsError> {
        let destination = destination.as_ref();
        fs::copy(&self.path, destination).map_err(|e| FsError::io(destination, e))?;
        Ok(FileHandler {
            path: destination.to_path_buf(),
        })
    }

    /// Moves the file, falling back to copy + delete across filesystems.
    pub fn move_to(self, destination: impl AsRef<Path>) -> Result<FileHandler, FsError> {
        let destination = destination.as_ref();
        if fs::rename(&self.path, destination).is_ok() {
            return Ok(FileHandler {
                path: destination.to_path_buf(),
            });
        }
        let copy = self.copy_to(destination)?;
        self.delete()?;
        Ok(copy)
    }

    pub fn metadata(&self) -> Result<FileMetadata, FsError> {
        let metadata = fs::metadata(&self.path).map_err(|e| FsError::io(&self.path, e))?;
        Ok(FileMetadata {
            path: self.path.clone(),
            size: metadata.len(),
            is_file: metadata.is_file(),
            readonly: metadata.permissions().readonly(),
            executable: is_executable(&metadata),
            modified: metadata.modified().ok(),
        })
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.is_file()
}

/// Reads a whole file into a string.
pub fn load_file(path: impl AsRef<Path>) -> Result<String, FsError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FsError::FileNotFound(path.to_path_buf()),
        _ => FsError::io(path, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file() {
        let result = FileHandler::open("/nonexistent/App.ini.php");
        assert!(matches!(result, Err(FsError::FileNotFound(_))));
    }

    #[test]
    fn test_write_append_read() {
        let dir = TempDir::new().unwrap();
        let handler = FileHandler::create(dir.path().join("notes.txt")).unwrap();

        handler.write("Hello, World!").unwrap();
        handler.append(" How are you today?").unwrap();

        assert_eq!(handler.read().unwrap(), "Hello, World! How are you today?");
        let metadata = handler.metadata().unwrap();
        assert_eq!(metadata.size, 32);
        assert!(metadata.is_file);
        assert!(metadata.modified.is_some());
    }

    #[test]
    fn test_write_truncates() {
        let dir = TempDir::new().unwrap();
        let handler = FileHandler::create(dir.path().join("a.txt")).unwrap();
        handler.write("long content").unwrap();
        handler.write("short").unwrap();
        assert_eq!(handler.read().unwrap(), "short");
    }

    #[test]
    fn test_copy_move_delete() {
        let dir = TempDir::new().unwrap();
        let original = FileHandler::create(dir.path().join("a.txt")).unwrap();
        original.write("data").unwrap();

        let copy = original.copy_to(dir.path().join("b.txt")).unwrap();
        assert!(original.exists());
        assert_eq!(copy.read().unwrap(), "data");

        let moved = copy.move_to(dir.path().join("c.txt")).unwrap();
        assert!(!dir.path().join("b.txt").exists());
        assert_eq!(moved.read().unwrap(), "data");

        moved.delete().unwrap();
        assert!(!dir.path().join("c.txt").exists());
    }

    #[test]
    fn test_create_temp_file() {
        let dir = TempDir::new().unwrap();
        let first = FileHandler::create_temp_file_in(dir.path(), "bw_").unwrap();
        let second = FileHandler::create_temp_file_in(dir.path(), "bw_").unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first.exists());
        assert!(first
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("bw_"));
        assert_eq!(first.read().unwrap(), "");

        first.delete().unwrap();
        assert!(second.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let handler = FileHandler::create(dir.path().join("run.sh")).unwrap();
        assert!(!handler.is_executable());
        assert!(!handler.metadata().unwrap().executable);

        fs::set_permissions(handler.path(), fs::Permissions::from_mode(0o755)).unwrap();
        assert!(handler.is_executable());
        assert!(handler.metadata().unwrap().executable);
    }

    #[test]
    fn test_load_file_missing() {
        let result = load_file("/nonexistent/file.ini");
        assert!(matches!(result, Err(FsError::FileNotFound(_))));
    }
}
