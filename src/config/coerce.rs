//! Type coercion for raw configuration strings.

use toml::Value;

/// Converts a raw string to the most specific value it canonically represents.
///
/// - `t`, `true`, `f`, `false` (any case) become booleans
/// - `null` (any case) becomes the empty string
/// - integers and floats are recognized only when their canonical rendering
///   matches the input exactly, so `0644`, `+5`, `.1` and `8.0` stay strings
/// - anything else is returned as a string
pub fn convert(raw: &str) -> Value {
    if let Some(b) = boolean(raw) {
        return Value::Boolean(b);
    }
    if raw.eq_ignore_ascii_case("null") {
        return Value::String(String::new());
    }

    if let Ok(i) = raw.parse::<i64>() {
        if i.to_string() == raw {
            return Value::Integer(i);
        }
    }

    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() && f.to_string() == raw {
            return Value::Float(f);
        }
    }

    Value::String(raw.to_string())
}

/// Recognizes the boolean words `t`, `true`, `f`, `false` in any case.
pub fn boolean(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "t" | "true" => Some(true),
        "f" | "false" => Some(false),
        _ => None,
    }
}

/// Classification of a configuration value.
///
/// Codes match the framework's `TYPE_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Unknown,
    Null,
    Int,
    String,
    Float,
    Bool,
    Array,
    Object,
    Alpha,
    AlphaNumeric,
}

impl DataType {
    pub fn code(self) -> i64 {
        match self {
            DataType::Unknown => -1,
            DataType::Null => 0,
            DataType::Int => 1,
            DataType::String => 3,
            DataType::Float => 4,
            DataType::Bool => 6,
            DataType::Array => 7,
            DataType::Object => 8,
            DataType::Alpha => 13,
            DataType::AlphaNumeric => 14,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        let data_type = match code {
            -1 => DataType::Unknown,
            0 => DataType::Null,
            1 => DataType::Int,
            3 => DataType::String,
            4 => DataType::Float,
            6 => DataType::Bool,
            7 => DataType::Array,
            8 => DataType::Object,
            13 => DataType::Alpha,
            14 => DataType::AlphaNumeric,
            _ => return None,
        };
        Some(data_type)
    }
}

/// Classifies a value. Strings are inspected for their content, so `"42"`
/// is `Int` and `"abc"` is `Alpha`.
pub fn classify(value: &Value) -> DataType {
    match value {
        Value::Array(_) => DataType::Array,
        Value::Table(_) => DataType::Object,
        Value::Boolean(_) => DataType::Bool,
        Value::Integer(_) => DataType::Int,
        Value::Float(_) => DataType::Float,
        Value::Datetime(_) => DataType::Unknown,
        Value::String(s) => classify_str(s),
    }
}

fn classify_str(s: &str) -> DataType {
    if s.is_empty() {
        DataType::Null
    } else if s.chars().all(char::is_alphabetic) {
        DataType::Alpha
    } else if s.parse::<i64>().is_ok() {
        DataType::Int
    } else if s.parse::<f64>().is_ok_and(f64::is_finite) {
        DataType::Float
    } else if s.chars().all(char::is_alphanumeric) {
        DataType::AlphaNumeric
    } else {
        DataType::String
    }
}

/// Lowercases `s` and capitalizes its first character.
pub fn upper_first(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
