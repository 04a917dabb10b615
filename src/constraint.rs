use crate::value::Value;
use regex::Regex;

/// Name of the failure reported for env variables the schema does not declare
pub const UNKNOWN_PROPERTY: &str = "whitelistValidation";

/// A named check on a single (coerced) value
///
/// Every constraint is evaluated on its own, so one value can fail several of
/// them at once. A missing value fails every constraint it is checked against.
#[derive(Debug, Clone)]
pub enum Constraint {
    IsBoolean,
    IsInt,
    IsNumber,
    IsString,
    NotEmpty,
    Max(f64),
    Min(f64),
    /// Upper limit of the Rust type; only checked on numbers
    TypeMax(f64),
    TypeMin(f64),
    Matches(Regex),
    IsEnum(Vec<String>),
    Nested(String),
}

impl Constraint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IsBoolean => "isBoolean",
            Self::IsInt => "isInt",
            Self::IsNumber => "isNumber",
            Self::IsString => "isString",
            Self::NotEmpty => "isNotEmpty",
            Self::Max(_) | Self::TypeMax(_) => "max",
            Self::Min(_) | Self::TypeMin(_) => "min",
            Self::Matches(_) => "matches",
            Self::IsEnum(_) => "isEnum",
            Self::Nested(_) => "nestedValidation",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::IsBoolean => "must be one of accepted boolean values=[true, false, 1, 0]".to_string(),
            Self::IsInt => "should be integer".to_string(),
            Self::IsNumber => {
                "should be number (int and float accepted. Float separator is '.')".to_string()
            }
            Self::IsString => "must be string".to_string(),
            Self::NotEmpty => "must be non-empty string".to_string(),
            Self::Max(max) | Self::TypeMax(max) => {
                format!("must not be greater than {}", Value::Number(*max))
            }
            Self::Min(min) | Self::TypeMin(min) => {
                format!("must not be lower than {}", Value::Number(*min))
            }
            Self::Matches(regex) => format!("must match /{}/ regular expression", regex.as_str()),
            Self::IsEnum(values) => format!("must be one of values ['{}']", values.join("', '")),
            Self::Nested(schema) => format!("must be object of class \"{}\"", schema),
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::IsBoolean, Value::Bool(_)) => true,
            (Self::IsInt, Value::Number(n)) => n.is_finite() && n.fract() == 0.0,
            (Self::IsNumber, Value::Number(n)) => n.is_finite(),
            (Self::IsString, Value::Str(_)) => true,
            (Self::NotEmpty, Value::Undefined) => false,
            (Self::NotEmpty, Value::Str(s)) => !s.is_empty(),
            (Self::NotEmpty, _) => true,
            (Self::Max(max), Value::Number(n)) => n <= max,
            (Self::Min(min), Value::Number(n)) => n >= min,
            (Self::TypeMax(max), Value::Number(n)) => n <= max,
            (Self::TypeMin(min), Value::Number(n)) => n >= min,
            (Self::TypeMax(_) | Self::TypeMin(_), _) => true,
            (Self::Matches(regex), Value::Str(s)) => regex.is_match(s),
            (Self::IsEnum(values), Value::Str(s)) => values.iter().any(|v| v == s),
            (Self::Nested(_), Value::Object(_)) => true,
            _ => false,
        }
    }
}
