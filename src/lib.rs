//! Bootstrap and configuration layer for Bluewater 8 MVC sites.

pub mod config;
pub mod context;
mod error;
pub mod fs;
pub mod instance;
pub mod layout;

pub use config::{Conf, Config, ConfigError};
pub use context::AppContext;
pub use error::Error;
pub use layout::Layout;
