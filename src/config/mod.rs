//! Configuration loading and management.
//!
//! A site is configured by `*.ini.php` files in two directories: the
//! framework's `Bluewater/Config` and the application's `App/Config`.
//! [`Config`] loads them in that order, merges them (application wins),
//! splits out the `[constants]` section, substitutes `{NAME}` references
//! and yields a [`Conf`].

mod builder;
pub mod cache;
pub mod coerce;
mod conf;
mod dir;
mod env;
mod error;
mod file;
pub mod ini;
mod resolve;
mod source;

pub use builder::Config;
pub use coerce::DataType;
pub use conf::Conf;
pub use dir::DirSource;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use resolve::has_reference;
pub use source::{deep_merge, merge_at_path, ConfigEntry, ConfigSource};
