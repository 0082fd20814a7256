use std::path::PathBuf;
use thiserror::Error;

use super::ini;
use crate::fs::FsError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("required config directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: ini::ParseError,
    },

    #[error("failed to parse config cache '{path}': {source}")]
    CacheParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config cache: {0}")]
    CacheSerializeError(#[from] toml::ser::Error),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error("circular reference detected in constants: {0}")]
    CircularReference(String),

    #[error("undefined constant {{{name}}} referenced by '{key}'")]
    UndefinedConstant { name: String, key: String },

    #[error("cannot reference non-scalar constant: {0}")]
    NonScalarReference(String),

    #[error("config section not found: {0}")]
    MissingSection(String),
}
