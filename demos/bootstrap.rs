use bluewater::{AppContext, Config, Layout};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Settings {
    general: General,
    database: Database,
}

#[derive(Debug, Deserialize)]
struct General {
    tz: String,
    locale: String,
}

#[derive(Debug, Deserialize)]
struct Database {
    supported: Vec<String>,
}

fn main() -> Result<(), bluewater::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let layout = Layout::builder("demos/site")
        .cache_root(std::env::temp_dir().join("bluewater-demo"))
        .build();

    // IMAGE_PATH is not defined anywhere, so keep it as literal text.
    // Caching is off so running the demo leaves demos/site untouched.
    let config = Config::for_layout(&layout)
        .with_env("BW", "__")
        .with_cache(false)
        .allow_unresolved(true)
        .build()?;

    let ctx = AppContext::builder()
        .with_layout(layout)
        .with_config(config)
        .build()?
        .install();

    let settings: Settings = ctx.settings()?;
    let conf = ctx.config();

    println!("Bluewater {} ({})", show(conf.constant("BW_VER")), show(conf.constant("BW_ENV")));
    println!("Timezone: {} / locale: {}", settings.general.tz, settings.general.locale);
    println!("Error log: {}", show(conf.constant("ERR_FILE_PATH")));
    println!("Cookie expiry: {}", show(conf.constant("COOKIE_EXPIRE")));
    println!("Databases: {}", settings.database.supported.join(", "));

    Ok(())
}

fn show(value: Option<&toml::Value>) -> String {
    match value {
        Some(toml::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<unset>".to_string(),
    }
}
