//! Filesystem layout of a Bluewater site.
//!
//! A site has a web-inaccessible root (`SITE_ROOT`) holding the framework
//! (`BLUEWATER`), the application (`APP_ROOT`), a cache directory and a
//! library directory. Every application path is derived from `APP_ROOT`:
//!
//! ```text
//! SITE_ROOT/
//! ├── Bluewater/Config/*.ini.php   framework configuration
//! ├── App/
//! │   ├── Config/*.ini.php         application configuration
//! │   ├── Helper/ Plugin/ Modules/ Logs/ Collections/
//! │   └── MVC/{Model,Controller,View/Templates}
//! ├── cache/
//! └── Library/
//! ```
//!
//! [`Layout::constants`] exports these paths as the `{NAME}` constants that
//! configuration values may reference.

use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use toml::{Table, Value};

const CONFIG_DIR: &str = "Config";

/// Resolved directory layout of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    site_root: PathBuf,
    bluewater: PathBuf,
    cache_root: PathBuf,
    library: PathBuf,
    app_root: PathBuf,
}

impl Layout {
    /// Derives the default layout under `site_root`.
    pub fn new(site_root: impl AsRef<Path>) -> Self {
        Self::builder(site_root).build()
    }

    pub fn builder(site_root: impl AsRef<Path>) -> LayoutBuilder {
        LayoutBuilder {
            site_root: trim_separator(site_root.as_ref()),
            bluewater: None,
            cache_root: None,
            library: None,
            app_root: None,
        }
    }

    pub fn site_root(&self) -> &Path {
        &self.site_root
    }

    pub fn bluewater(&self) -> &Path {
        &self.bluewater
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn library(&self) -> &Path {
        &self.library
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    pub fn app_config(&self) -> PathBuf {
        self.app_root.join(CONFIG_DIR)
    }

    pub fn app_helper(&self) -> PathBuf {
        self.app_root.join("Helper")
    }

    pub fn app_plugin(&self) -> PathBuf {
        self.app_root.join("Plugin")
    }

    pub fn app_module(&self) -> PathBuf {
        self.app_root.join("Modules")
    }

    pub fn app_logs(&self) -> PathBuf {
        self.app_root.join("Logs")
    }

    pub fn app_collections(&self) -> PathBuf {
        self.app_root.join("Collections")
    }

    pub fn app_mvc(&self) -> PathBuf {
        self.app_root.join("MVC")
    }

    pub fn app_model(&self) -> PathBuf {
        self.app_mvc().join("Model")
    }

    pub fn app_control(&self) -> PathBuf {
        self.app_mvc().join("Controller")
    }

    pub fn app_view(&self) -> PathBuf {
        self.app_mvc().join("View")
    }

    pub fn app_template(&self) -> PathBuf {
        self.app_view().join("Templates")
    }

    /// Directory holding the framework-level `*.ini.php` files.
    pub fn framework_config_dir(&self) -> PathBuf {
        self.bluewater.join(CONFIG_DIR)
    }

    /// Directory holding the application-level `*.ini.php` files.
    pub fn app_config_dir(&self) -> PathBuf {
        self.app_config()
    }

    /// All layout paths as string constants, plus `DS` (the path separator).
    pub fn constants(&self) -> Table {
        let paths = [
            ("SITE_ROOT", self.site_root.clone()),
            ("BLUEWATER", self.bluewater.clone()),
            ("CACHE_ROOT", self.cache_root.clone()),
            ("LIBRARY", self.library.clone()),
            ("APP_ROOT", self.app_root.clone()),
            ("APP_CONFIG", self.app_config()),
            ("APP_HELPER", self.app_helper()),
            ("APP_PLUGIN", self.app_plugin()),
            ("APP_MODULE", self.app_module()),
            ("APP_LOGS", self.app_logs()),
            ("APP_COLLECTIONS", self.app_collections()),
            ("APP_MVC", self.app_mvc()),
            ("APP_MODEL", self.app_model()),
            ("APP_CONTROL", self.app_control()),
            ("APP_VIEW", self.app_view()),
            ("APP_TEMPLATE", self.app_template()),
        ];

        let mut table = Table::new();
        table.insert("DS".into(), Value::String(MAIN_SEPARATOR_STR.into()));
        for (name, path) in paths {
            table.insert(
                name.into(),
                Value::String(path.to_string_lossy().into_owned()),
            );
        }
        table
    }

    /// Directories a bootable site must have that do not exist on disk.
    pub fn missing_dirs(&self) -> Vec<PathBuf> {
        [
            self.site_root.clone(),
            self.bluewater.clone(),
            self.framework_config_dir(),
            self.app_root.clone(),
            self.app_config_dir(),
        ]
        .into_iter()
        .filter(|dir| !dir.is_dir())
        .collect()
    }
}

/// Builder for a [`Layout`] with non-default roots.
#[derive(Debug, Clone)]
#[must_use = "builders do nothing until .build() is called"]
pub struct LayoutBuilder {
    site_root: PathBuf,
    bluewater: Option<PathBuf>,
    cache_root: Option<PathBuf>,
    library: Option<PathBuf>,
    app_root: Option<PathBuf>,
}

impl LayoutBuilder {
    /// Framework root. Defaults to `SITE_ROOT/Bluewater`.
    pub fn bluewater(mut self, path: impl AsRef<Path>) -> Self {
        self.bluewater = Some(trim_separator(path.as_ref()));
        self
    }

    /// Cache root. Defaults to `SITE_ROOT/cache`.
    pub fn cache_root(mut self, path: impl AsRef<Path>) -> Self {
        self.cache_root = Some(trim_separator(path.as_ref()));
        self
    }

    /// Library root. Defaults to `SITE_ROOT/Library`.
    pub fn library(mut self, path: impl AsRef<Path>) -> Self {
        self.library = Some(trim_separator(path.as_ref()));
        self
    }

    /// Application root. Defaults to `SITE_ROOT/App`.
    pub fn app_root(mut self, path: impl AsRef<Path>) -> Self {
        self.app_root = Some(trim_separator(path.as_ref()));
        self
    }

    pub fn build(self) -> Layout {
        let site_root = self.site_root;
        Layout {
            bluewater: self
                .bluewater
                .unwrap_or_else(|| site_root.join("Bluewater")),
            cache_root: self.cache_root.unwrap_or_else(|| site_root.join("cache")),
            library: self.library.unwrap_or_else(|| site_root.join("Library")),
            app_root: self.app_root.unwrap_or_else(|| site_root.join("App")),
            site_root,
        }
    }
}

// Paths are stored without a trailing separator so `{APP_ROOT}{DS}x`
// renders a single separator.
fn trim_separator(path: &Path) -> PathBuf {
    path.components().collect()
}
