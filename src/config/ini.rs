//! Parser for the framework's INI dialect.
//!
//! The dialect is classic INI with a few additions:
//!
//! - An optional PHP guard header (`<?php ... ?>`) that keeps the file from
//!   being served directly. Everything up to the first `?>` is skipped.
//! - Dotted keys build nested tables: `db.host = x` yields `{ db = { host = x } }`.
//! - `key[] = v` appends to an array.
//! - `[child : parent]` starts `child` as a copy of an earlier `parent`.
//! - Unquoted values are type-coerced; quoted values stay strings, except
//!   boolean words, so `'false'` is a real boolean.
//!
//! Every key must live under a `[section]` header.

use thiserror::Error;
use toml::{Table, Value};
use tracing::warn;

use super::coerce;
use super::resolve::has_reference;

const GUARD_OPEN: &str = "<?php";
const GUARD_CLOSE: &str = "?>";
const ARRAY_SUFFIX: &str = "[]";

/// A syntax error with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("PHP guard header has no closing '?>'")]
    UnterminatedGuard,

    #[error("section header is missing ']'")]
    UnclosedSection,

    #[error("empty section name")]
    EmptySectionName,

    #[error("section '{child}' extends undefined section '{parent}'")]
    UnknownParent { child: String, parent: String },

    #[error("key '{0}' appears before any [section] header")]
    KeyOutsideSection(String),

    #[error("empty key")]
    EmptyKey,
}

/// Parses INI text into a table of sections.
pub fn parse(input: &str) -> Result<Table, ParseError> {
    let (body, first_line) = strip_guard(input)?;

    let mut sections = Table::new();
    let mut current: Option<String> = None;

    for (index, raw) in body.lines().enumerate() {
        let line_no = first_line + index;
        let line = raw.trim();

        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let error = |kind| ParseError {
            line: line_no,
            kind,
        };

        if let Some(header) = line.strip_prefix('[') {
            let (name, parent) = parse_header(header).map_err(error)?;
            if !sections.contains_key(&name) {
                let base = match parent {
                    Some(parent) => match sections.get(&parent) {
                        Some(Value::Table(base)) => base.clone(),
                        _ => {
                            return Err(error(ParseErrorKind::UnknownParent {
                                child: name,
                                parent,
                            }))
                        }
                    },
                    None => Table::new(),
                };
                sections.insert(name.clone(), Value::Table(base));
            }
            current = Some(name);
            continue;
        }

        let Some((key, raw_value)) = line.split_once('=') else {
            warn!(line = line_no, "skipping config line without '=': {line}");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(error(ParseErrorKind::EmptyKey));
        }

        let section = match current.as_deref().and_then(|name| sections.get_mut(name)) {
            Some(Value::Table(section)) => section,
            _ => return Err(error(ParseErrorKind::KeyOutsideSection(key.to_string()))),
        };

        let (key, append) = match key.strip_suffix(ARRAY_SUFFIX) {
            Some(key) => (key.trim_end(), true),
            None => (key, false),
        };
        insert_at(section, &key_path(key), parse_value(raw_value), append);
    }

    Ok(sections)
}

/// Returns the text after the guard header and the line number it starts on.
fn strip_guard(input: &str) -> Result<(&str, usize), ParseError> {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    let trimmed = text.trim_start();
    let guarded = trimmed
        .get(..GUARD_OPEN.len())
        .is_some_and(|open| open.eq_ignore_ascii_case(GUARD_OPEN));
    if !guarded {
        return Ok((text, 1));
    }

    let leading = text.len() - trimmed.len();
    let Some(close) = trimmed.find(GUARD_CLOSE) else {
        return Err(ParseError {
            line: 1 + text[..leading].matches('\n').count(),
            kind: ParseErrorKind::UnterminatedGuard,
        });
    };

    let consumed = leading + close + GUARD_CLOSE.len();
    let line = 1 + text[..consumed].matches('\n').count();
    Ok((&text[consumed..], line))
}

/// Parses the inside of `[name]` or `[name : parent]`.
fn parse_header(header: &str) -> Result<(String, Option<String>), ParseErrorKind> {
    let (inner, _) = header
        .split_once(']')
        .ok_or(ParseErrorKind::UnclosedSection)?;

    let (name, parent) = match inner.split_once(':') {
        Some((name, parent)) => (name.trim(), Some(parent.trim())),
        None => (inner.trim(), None),
    };
    if name.is_empty() || parent.is_some_and(str::is_empty) {
        return Err(ParseErrorKind::EmptySectionName);
    }
    Ok((name.to_string(), parent.map(str::to_string)))
}

// A key with an empty dotted segment (`a..b`, `.a`) is kept literally.
fn key_path(key: &str) -> Vec<String> {
    let segments: Vec<&str> = key.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return vec![key.to_string()];
    }
    segments.into_iter().map(str::to_string).collect()
}

fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();

    if let Some(quoted) = unquote(raw) {
        return match coerce::boolean(quoted) {
            Some(b) => Value::Boolean(b),
            None => Value::String(quoted.to_string()),
        };
    }

    let bare = match raw.find(';') {
        Some(comment) => raw[..comment].trim_end(),
        None => raw,
    };
    if has_reference(bare) {
        Value::String(bare.to_string())
    } else {
        coerce::convert(bare)
    }
}

/// Strips matching outer quotes from a value followed by nothing or a comment.
///
/// The closing quote is the first matching quote character after which only
/// whitespace or a `;` comment remains, so quotes nested inside the value
/// (`"<img src="x"/>"`) survive.
fn unquote(raw: &str) -> Option<&str> {
    let quote = raw.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = &raw[1..];
    inner
        .match_indices(quote)
        .find(|(i, _)| {
            let tail = inner[i + 1..].trim_start();
            tail.is_empty() || tail.starts_with(';')
        })
        .map(|(i, _)| &inner[..i])
}

fn insert_at(table: &mut Table, path: &[String], value: Value, append: bool) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        if !append {
            table.insert(first.clone(), value);
            return;
        }
        match table.get_mut(first) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                table.insert(first.clone(), Value::Array(vec![value]));
            }
        }
        return;
    }

    if !matches!(table.get(first), Some(Value::Table(_))) {
        table.insert(first.clone(), Value::Table(Table::new()));
    }
    if let Some(Value::Table(nested)) = table.get_mut(first) {
        insert_at(nested, rest, value, append);
    }
}
