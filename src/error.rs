use crate::config::ConfigError;
use crate::fs::FsError;
use crate::instance::InstanceError;
use thiserror::Error;

/// Top-level error type for the bluewater library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("application context requires a configuration")]
    MissingConfig,

    #[error("application context requires a layout")]
    MissingLayout,
}
