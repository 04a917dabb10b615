//! Best-effort conversion of raw env strings into typed values.
//!
//! Every coercer hands back the raw text when it cannot convert it, so the
//! validation step reports the value exactly as it appeared in the env file.

use crate::value::{Coerced, Value};
use tracing::trace;

/// Separator for array (CSV) fields
pub const CSV_SEPARATOR: char = ',';

const ESCAPE: char = '\\';

/// `"true"`/`"1"` and `"false"`/`"0"`, anything else is left raw
pub fn coerce_boolean(raw: &str) -> Coerced<bool> {
    match raw {
        "true" | "1" => Coerced::Coerced(true),
        "false" | "0" => Coerced::Coerced(false),
        _ => Coerced::Raw(raw.to_string()),
    }
}

/// Parses ints and floats alike. Integer-ness is checked later by a constraint.
pub fn coerce_number(raw: &str) -> Coerced<f64> {
    match parse_number(raw) {
        Some(n) if n.is_finite() => Coerced::Coerced(n),
        _ => Coerced::Raw(raw.to_string()),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let radix_prefixes = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)];
    for (prefix, radix) in radix_prefixes {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }

    trimmed.parse::<f64>().ok()
}

/// Literals wider than 128 bits still parse, rounded to the nearest `f64`
fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    match u128::from_str_radix(digits, radix) {
        Ok(n) => Some(n as f64),
        Err(_) => Some(
            digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
        ),
    }
}

pub fn coerce_string(raw: &str) -> Coerced<String> {
    Coerced::Coerced(raw.to_string())
}

/// Identity: membership is a constraint, not a conversion
pub fn coerce_enum(raw: &str) -> Coerced<String> {
    Coerced::Coerced(raw.to_string())
}

/// Splits on every occurrence of `separator`
pub fn split_csv(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator).map(str::to_string).collect()
}

/// Splits on `separator` unless it is preceded by a backslash; `\,` becomes a literal `,`
pub fn split_csv_escaped(raw: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESCAPE && chars.peek() == Some(&separator) {
            current.push(separator);
            chars.next();
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);

    parts
}

/// Kind-specific coercion attached to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercer {
    Boolean,
    Number,
    String,
    Enum,
    /// Nested objects are coerced field by field by their own schema
    Object,
}

impl Coercer {
    fn coerce_scalar(&self, raw: &str) -> Value {
        match self {
            Self::Boolean => coerce_boolean(raw).into_value(),
            Self::Number => coerce_number(raw).into_value(),
            Self::String => coerce_string(raw).into_value(),
            Self::Enum => coerce_enum(raw).into_value(),
            Self::Object => Value::Str(raw.to_string()),
        }
    }

    /// Coerce a field value. Only raw strings are touched; defaults declared in
    /// the schema are already typed (arrays included) and pass through.
    pub fn apply(&self, value: Value, array: bool, separator: char) -> Value {
        let coerced = match value {
            Value::Str(raw) if array => {
                let parts = match self {
                    Self::String => split_csv_escaped(&raw, separator),
                    _ => split_csv(&raw, separator),
                };
                Value::List(parts.iter().map(|part| self.coerce_scalar(part)).collect())
            }
            Value::Str(raw) => self.coerce_scalar(&raw),
            other => other,
        };
        trace!(coercer = ?self, value = %coerced, "coerced value");
        coerced
    }
}
