//! Directory scanning and single-file helpers.

mod error;
mod handler;
mod reader;

pub use error::FsError;
pub use handler::{load_file, FileHandler, FileMetadata};
pub use reader::{check_dir, DirectoryReader, INI_PHP_SUFFIX, INI_SUFFIX};
