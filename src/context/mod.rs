//! Application context: the site layout plus its loaded configuration.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::{Conf, Config};
use crate::instance::Singleton;
use crate::layout::Layout;
use crate::Error;

static GLOBAL: Singleton<AppContext> = Singleton::new();

/// Central application context holding the layout and configuration.
///
/// Build one per site with [`AppContext::bootstrap`], or assemble it from
/// parts with [`AppContext::builder`]. [`install`](Self::install) makes it
/// the process-wide context returned by [`AppContext::global`].
///
/// ## Example
///
/// ```no_run
/// use bluewater::{AppContext, Config, Layout};
///
/// let layout = Layout::new("/srv/site");
/// let ctx = AppContext::builder()
///     .with_config(Config::for_layout(&layout).allow_unresolved(true).build()?)
///     .with_layout(layout)
///     .build()?;
///
/// let tz = ctx.config().get_str("general", "tz");
/// # Ok::<(), bluewater::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext {
    layout: Layout,
    config: Conf,
}

impl AppContext {
    /// Loads the standard framework + application configuration for `layout`.
    pub fn bootstrap(layout: Layout) -> Result<Self, Error> {
        let config = Config::for_layout(&layout).build()?;
        info!(site_root = %layout.site_root().display(), "bootstrapped application context");
        Ok(Self { layout, config })
    }

    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder {
            layout: None,
            config: None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &Conf {
        &self.config
    }

    /// Deserializes the configuration sections into `T`.
    pub fn settings<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(self.config.deserialize()?)
    }

    /// Installs this context as the process-wide one, replacing any previous.
    pub fn install(self) -> Arc<AppContext> {
        GLOBAL.set(self)
    }

    /// The process-wide context, if one has been installed.
    pub fn global() -> Option<Arc<AppContext>> {
        GLOBAL.get()
    }

    /// Removes the process-wide context.
    pub fn uninstall() -> Option<Arc<AppContext>> {
        GLOBAL.reset()
    }
}

/// Builder for constructing an [`AppContext`] from parts.
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    layout: Option<Layout>,
    config: Option<Conf>,
}

impl AppContextBuilder {
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Attaches a configuration, usually the result of [`Config::build`].
    pub fn with_config(mut self, config: Conf) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `AppContext`.
    ///
    /// Returns an error if the layout or configuration is missing.
    pub fn build(self) -> Result<AppContext, Error> {
        Ok(AppContext {
            layout: self.layout.ok_or(Error::MissingLayout)?,
            config: self.config.ok_or(Error::MissingConfig)?,
        })
    }
}
