//! Constant substitution for configuration values.
//!
//! String values may embed `{NAME}` references, where `NAME` is an
//! upper-case constant name (`[A-Z_][A-Z0-9_]*`). A reference is replaced by
//! the constant's value, looked up first among the configuration's own
//! constants and then among the layout constants (`APP_ROOT`, `DS`, ...).
//! Braces around anything else are left as literal text.
//!
//! Substitution is purely textual: `{DAY}*10` becomes `86400*10`.

use std::collections::{BTreeMap, BTreeSet};

use toml::{Table, Value};
use tracing::warn;

use super::ConfigError;

const MAX_ITERATIONS: usize = 100;

/// Resolves references in `constants`, then in `sections`.
///
/// Constants may reference each other in any order. Sections may reference
/// constants but not other section values. With `allow_unresolved`, unknown
/// names are left in place and reported once as a warning; otherwise they
/// are an error.
pub fn resolve_references(
    constants: &mut Table,
    sections: &mut Table,
    layout: &Table,
    allow_unresolved: bool,
) -> Result<(), ConfigError> {
    let mut unresolved = BTreeSet::new();

    resolve_constants(constants, layout, allow_unresolved, &mut unresolved)?;

    let lookup = Lookup {
        constants: &*constants,
        layout,
        allow_unresolved,
    };
    for (name, value) in sections.iter_mut() {
        resolve_value(value, name, &lookup, &mut unresolved)?;
    }

    if !unresolved.is_empty() {
        let names: Vec<_> = unresolved.into_iter().collect();
        warn!("left unresolved config references: {}", names.join(", "));
    }
    Ok(())
}

/// Resolves constants against each other until no more substitutions are made.
///
/// Cycles are rejected up front, so the passes only ever follow finite chains.
fn resolve_constants(
    constants: &mut Table,
    layout: &Table,
    allow_unresolved: bool,
    unresolved: &mut BTreeSet<String>,
) -> Result<(), ConfigError> {
    if let Some(cycle) = find_cycle(constants) {
        return Err(ConfigError::CircularReference(cycle.join(", ")));
    }

    for _ in 0..MAX_ITERATIONS {
        let snapshot = constants.clone();
        let lookup = Lookup {
            constants: &snapshot,
            layout,
            allow_unresolved,
        };

        let mut substitutions = 0;
        for (key, value) in constants.iter_mut() {
            substitutions += resolve_value(value, key, &lookup, unresolved)?;
        }
        if substitutions == 0 {
            return Ok(());
        }
    }

    Err(ConfigError::CircularReference(
        constants.keys().cloned().collect::<Vec<_>>().join(", "),
    ))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Finds a cycle in the graph of constants referencing other constants.
///
/// Returns the constants on the cycle, sorted by name.
fn find_cycle(constants: &Table) -> Option<Vec<String>> {
    let edges: BTreeMap<&str, BTreeSet<&str>> = constants
        .iter()
        .map(|(name, value)| {
            let mut targets = BTreeSet::new();
            collect_references(value, &mut targets);
            targets.retain(|target| constants.contains_key(*target));
            (name.as_str(), targets)
        })
        .collect();

    let mut state = BTreeMap::new();
    let mut stack = Vec::new();
    for &name in edges.keys() {
        if let Some(mut cycle) = visit(name, &edges, &mut state, &mut stack) {
            cycle.sort();
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    name: &'a str,
    edges: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    state: &mut BTreeMap<&'a str, Visit>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    match state.get(name) {
        Some(Visit::Done) => return None,
        Some(Visit::InProgress) => {
            let start = stack.iter().position(|n| *n == name).unwrap_or(0);
            return Some(stack[start..].iter().map(|n| n.to_string()).collect());
        }
        None => {}
    }

    state.insert(name, Visit::InProgress);
    stack.push(name);
    for target in edges.get(name).into_iter().flatten() {
        if let Some(cycle) = visit(*target, edges, state, stack) {
            return Some(cycle);
        }
    }
    stack.pop();
    state.insert(name, Visit::Done);
    None
}

fn collect_references<'a>(value: &'a Value, out: &mut BTreeSet<&'a str>) {
    match value {
        Value::String(s) => out.extend(references(s)),
        Value::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        Value::Table(table) => table.values().for_each(|item| collect_references(item, out)),
        _ => {}
    }
}

struct Lookup<'a> {
    constants: &'a Table,
    layout: &'a Table,
    allow_unresolved: bool,
}

impl Lookup<'_> {
    fn get(&self, name: &str) -> Option<&Value> {
        self.constants.get(name).or_else(|| self.layout.get(name))
    }
}

/// Resolves references in a single value (recursively for tables/arrays).
/// `key` is the dotted path of the value, used in error messages.
/// Returns the number of substitutions made.
fn resolve_value(
    value: &mut Value,
    key: &str,
    lookup: &Lookup<'_>,
    unresolved: &mut BTreeSet<String>,
) -> Result<usize, ConfigError> {
    match value {
        Value::String(s) => resolve_string(s, key, lookup, unresolved),
        Value::Table(t) => {
            let mut count = 0;
            for (child, item) in t.iter_mut() {
                count += resolve_value(item, &format!("{key}.{child}"), lookup, unresolved)?;
            }
            Ok(count)
        }
        Value::Array(arr) => {
            let mut count = 0;
            for item in arr.iter_mut() {
                count += resolve_value(item, key, lookup, unresolved)?;
            }
            Ok(count)
        }
        _ => Ok(0),
    }
}

/// Replaces every `{NAME}` reference in `s`.
fn resolve_string(
    s: &mut String,
    key: &str,
    lookup: &Lookup<'_>,
    unresolved: &mut BTreeSet<String>,
) -> Result<usize, ConfigError> {
    if !has_reference(s) {
        return Ok(0);
    }

    let mut result = String::with_capacity(s.len());
    let mut substitutions = 0;
    let mut rest = s.as_str();

    while let Some(start) = rest.find('{') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let Some(name) = reference_at(after) else {
            result.push('{');
            rest = after;
            continue;
        };

        match lookup.get(name) {
            Some(value) => {
                result.push_str(&value_to_string(value, name)?);
                substitutions += 1;
            }
            None if lookup.allow_unresolved => {
                unresolved.insert(name.to_string());
                result.push('{');
                result.push_str(name);
                result.push('}');
            }
            None => {
                return Err(ConfigError::UndefinedConstant {
                    name: name.to_string(),
                    key: key.to_string(),
                });
            }
        }
        rest = &after[name.len() + 1..];
    }

    result.push_str(rest);
    *s = result;
    Ok(substitutions)
}

/// Returns the name if `after` (the text following a `{`) starts a reference.
fn reference_at(after: &str) -> Option<&str> {
    let end = after.find('}')?;
    let name = &after[..end];
    is_constant_name(name).then_some(name)
}

fn references(s: &str) -> impl Iterator<Item = &str> {
    s.match_indices('{')
        .filter_map(move |(i, _)| reference_at(&s[i + 1..]))
}

/// True if `s` contains at least one `{NAME}` reference.
pub fn has_reference(s: &str) -> bool {
    references(s).next().is_some()
}

fn is_constant_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Converts a scalar value to its textual form for substitution.
fn value_to_string(value: &Value, name: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) | Value::Table(_) => {
            Err(ConfigError::NonScalarReference(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(toml_str: &str) -> Table {
        toml::from_str(toml_str).unwrap()
    }

    fn layout() -> Table {
        make_table(
            r#"
            CACHE_ROOT = "/srv/site/cache"
            APP_ROOT = "/srv/site/App"
            DS = "/"
            "#,
        )
    }

    fn resolve(constants: &mut Table, sections: &mut Table) -> Result<(), ConfigError> {
        resolve_references(constants, sections, &layout(), false)
    }

    #[test]
    fn test_layout_reference() {
        let mut constants = make_table(r#"LOG_PATH = "{CACHE_ROOT}{DS}logs""#);
        resolve(&mut constants, &mut Table::new()).unwrap();
        assert_eq!(constants["LOG_PATH"].as_str(), Some("/srv/site/cache/logs"));
    }

    #[test]
    fn test_chained_constants() {
        let mut constants = make_table(
            r#"
            ERR_FILE_PATH = "{LOG_PATH}{DS}php_errors.log"
            LOG_PATH = "{CACHE_ROOT}{DS}logs"
            "#,
        );
        resolve(&mut constants, &mut Table::new()).unwrap();
        assert_eq!(
            constants["ERR_FILE_PATH"].as_str(),
            Some("/srv/site/cache/logs/php_errors.log")
        );
    }

    #[test]
    fn test_integer_coercion_is_textual() {
        let mut constants = make_table(
            r#"
            DAY = 86400
            COOKIE_EXPIRE = "{DAY}*10"
            "#,
        );
        resolve(&mut constants, &mut Table::new()).unwrap();
        assert_eq!(constants["COOKIE_EXPIRE"].as_str(), Some("86400*10"));
        assert_eq!(constants["DAY"].as_integer(), Some(86400));
    }

    #[test]
    fn test_sections_use_resolved_constants() {
        let mut constants = make_table(r#"LOCALE = "{APP_ROOT}{DS}locale""#);
        let mut sections = make_table(
            r#"
            [general]
            locale = "{LOCALE}"
            paths = ["{APP_ROOT}/a", "{APP_ROOT}/b"]
            "#,
        );
        resolve(&mut constants, &mut sections).unwrap();

        assert_eq!(
            sections["general"]["locale"].as_str(),
            Some("/srv/site/App/locale")
        );
        assert_eq!(
            sections["general"]["paths"][1].as_str(),
            Some("/srv/site/App/b")
        );
    }

    #[test]
    fn test_non_reference_braces_are_literal() {
        let mut sections = make_table(
            r#"
            [js]
            snippet = "function() { return {a: 1}; } {lower} {}"
            "#,
        );
        resolve(&mut Table::new(), &mut sections).unwrap();
        assert_eq!(
            sections["js"]["snippet"].as_str(),
            Some("function() { return {a: 1}; } {lower} {}")
        );
    }

    #[test]
    fn test_circular_reference() {
        let mut constants = make_table(
            r#"
            A = "{B}"
            B = "{A}"
            C = "fine"
            "#,
        );
        let result = resolve(&mut constants, &mut Table::new());
        match result {
            Err(ConfigError::CircularReference(names)) => assert_eq!(names, "A, B"),
            other => panic!("expected circular reference, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_that_grows() {
        let mut constants = make_table(
            r#"
            A = "{A}{A}"
            B = "{CACHE_ROOT}"
            "#,
        );
        let result = resolve(&mut constants, &mut Table::new());
        match result {
            Err(ConfigError::CircularReference(names)) => assert_eq!(names, "A"),
            other => panic!("expected circular reference, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_through_nested_value() {
        let mut constants = make_table(
            r#"
            A = "{B}/x"
            C = "{A}"
            B = ["{C}"]
            "#,
        );
        let result = resolve(&mut constants, &mut Table::new());
        match result {
            Err(ConfigError::CircularReference(names)) => assert_eq!(names, "A, B, C"),
            other => panic!("expected circular reference, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_dependency_is_not_a_cycle() {
        let mut constants = make_table(
            r#"
            BASE = "{APP_ROOT}"
            LEFT = "{BASE}/l"
            RIGHT = "{BASE}/r"
            BOTH = "{LEFT}{RIGHT}"
            "#,
        );
        resolve(&mut constants, &mut Table::new()).unwrap();
        assert_eq!(
            constants["BOTH"].as_str(),
            Some("/srv/site/App/l/srv/site/App/r")
        );
    }

    #[test]
    fn test_undefined_in_section_names_full_key() {
        let mut sections = make_table(
            r#"
            [general]
            icon = "{IMAGE_PATH}/warning.png"
            "#,
        );
        let result = resolve(&mut Table::new(), &mut sections);
        assert!(matches!(
            result,
            Err(ConfigError::UndefinedConstant { ref name, ref key })
                if name == "IMAGE_PATH" && key == "general.icon"
        ));
    }

    #[test]
    fn test_undefined_constant() {
        let mut constants = make_table(r#"WARN_ICON = "{IMAGE_PATH}{DS}warning.png""#);
        let result = resolve(&mut constants, &mut Table::new());
        assert!(matches!(
            result,
            Err(ConfigError::UndefinedConstant { ref name, ref key })
                if name == "IMAGE_PATH" && key == "WARN_ICON"
        ));
    }

    #[test]
    fn test_allow_unresolved_keeps_text() {
        let mut constants = make_table(r#"WARN_ICON = "{IMAGE_PATH}{DS}warning.png""#);
        resolve_references(&mut constants, &mut Table::new(), &layout(), true).unwrap();
        assert_eq!(
            constants["WARN_ICON"].as_str(),
            Some("{IMAGE_PATH}/warning.png")
        );
    }

    #[test]
    fn test_non_scalar_reference() {
        let mut constants = make_table(
            r#"
            LIST = ["a", "b"]
            USE = "{LIST}"
            "#,
        );
        let result = resolve(&mut constants, &mut Table::new());
        assert!(matches!(result, Err(ConfigError::NonScalarReference(_))));
    }

    #[test]
    fn test_has_reference() {
        assert!(has_reference("{CACHE_ROOT}{DS}logs"));
        assert!(has_reference("x{A1_B}y"));
        assert!(!has_reference("{lower}"));
        assert!(!has_reference("{1ABC}"));
        assert!(!has_reference("{UNCLOSED"));
    }
}
