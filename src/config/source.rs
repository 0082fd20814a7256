use toml::{Table, Value};

use super::ConfigError;

/// A value contributed by a source, placed at `path` in the merged table.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

/// Something that contributes configuration entries.
///
/// Implement this to feed the [`Config`](super::Config) builder from a
/// custom location.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Merges `value` into `table` at the nested `path`.
///
/// An empty path merges a table value into the root. Intermediate segments
/// that are missing or hold a non-table value are replaced by tables.
pub fn merge_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Value::Table(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (table.get_mut(first), value) {
            (Some(Value::Table(base)), Value::Table(overlay)) => {
                deep_merge(base, overlay);
            }
            (_, value) => {
                table.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(table.get(first), Some(Value::Table(_))) {
        table.insert(first.clone(), Value::Table(Table::new()));
    }

    if let Some(Value::Table(nested)) = table.get_mut(first) {
        merge_at_path(nested, rest, value);
    }
}

/// Merges `overlay` into `base`. Nested tables merge recursively; any other
/// value (arrays included) replaces the base value.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(toml_str: &str) -> Table {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_deep_merge_overrides_and_keeps() {
        let mut base = make_table(
            r#"
            [constants]
            BW_ENV = "development"
            PATH_BASE = false
            [general]
            tz = "America/Chicago"
            "#,
        );
        let overlay = make_table(
            r#"
            [constants]
            BW_ENV = "production"
            APP_VER = ".1"
            "#,
        );

        deep_merge(&mut base, overlay);

        let constants = base["constants"].as_table().unwrap();
        assert_eq!(constants["BW_ENV"].as_str(), Some("production"));
        assert_eq!(constants["PATH_BASE"].as_bool(), Some(false));
        assert_eq!(constants["APP_VER"].as_str(), Some(".1"));
        assert_eq!(base["general"]["tz"].as_str(), Some("America/Chicago"));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = make_table(r#"ext = ["php", "ini"]"#);
        deep_merge(&mut base, make_table(r#"ext = ["html"]"#));
        assert_eq!(base["ext"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_merge_at_nested_path() {
        let mut table = make_table(
            r#"
            [general]
            tz = "America/Chicago"
            debug = false
            "#,
        );
        merge_at_path(
            &mut table,
            &["general".into(), "tz".into()],
            Value::String("UTC".into()),
        );
        merge_at_path(
            &mut table,
            &["logging".into(), "level".into()],
            Value::String("debug".into()),
        );

        assert_eq!(table["general"]["tz"].as_str(), Some("UTC"));
        assert_eq!(table["general"]["debug"].as_bool(), Some(false));
        assert_eq!(table["logging"]["level"].as_str(), Some("debug"));
    }
}
