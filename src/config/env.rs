use super::coerce::convert;
use super::conf::CONSTANTS_SECTION;
use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Environment-variable overrides.
///
/// `BW__GENERAL__TZ=UTC` with prefix `BW` and separator `__` sets
/// `[general] tz`. Section names and keys are lowercased, except keys of
/// the `constants` section, which keep their case (`BW__CONSTANTS__BW_ENV`).
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn entries_from(&self, vars: impl IntoIterator<Item = (String, String)>) -> Vec<ConfigEntry> {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut entries = Vec::new();

        for (key, value) in vars {
            let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            if path_str.is_empty() {
                continue;
            }

            let mut segments = path_str.split(&self.separator);
            let Some(section) = segments.next().map(str::to_lowercase) else {
                continue;
            };
            let keep_case = section == CONSTANTS_SECTION;

            let mut path = vec![section];
            path.extend(segments.map(|s| {
                if keep_case {
                    s.to_string()
                } else {
                    s.to_lowercase()
                }
            }));

            entries.push(ConfigEntry::at_path(path, convert(&value)));
        }

        entries
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        Ok(self.entries_from(std::env::vars()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_section_keys_are_lowercased() {
        let source = EnvSource::new("BW", "__");
        let entries = source.entries_from(vars(&[
            ("BW__GENERAL__TZ", "UTC"),
            ("BW__DATABASE__POOL__SIZE", "8"),
            ("OTHER__GENERAL__TZ", "ignored"),
            ("BW__", "ignored"),
        ]));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, ["general", "tz"]);
        assert_eq!(entries[0].value, Value::String("UTC".into()));
        assert_eq!(entries[1].path, ["database", "pool", "size"]);
        assert_eq!(entries[1].value, Value::Integer(8));
    }

    #[test]
    fn test_constant_keys_keep_case() {
        let source = EnvSource::new("BW", "__");
        let entries = source.entries_from(vars(&[("BW__CONSTANTS__BW_ENV", "production")]));

        assert_eq!(entries[0].path, ["constants", "BW_ENV"]);
    }

    #[test]
    fn test_values_are_coerced() {
        let source = EnvSource::new("APP", "_");
        let entries = source.entries_from(vars(&[("APP_general_debug", "true")]));
        assert_eq!(entries[0].value, Value::Boolean(true));
    }
}
