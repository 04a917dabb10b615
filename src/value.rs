use indexmap::IndexMap;
use std::fmt;

/// Property name to value, used for schema instances and loaded configuration
///
/// Keeps insertion order: declared fields in declaration order, anything else
/// in the order it was read from the env file.
pub type ConfigValues = IndexMap<String, Value>;

/// A configuration value at any stage of the pipeline
///
/// Raw values read from the env file start as [`Value::Str`], coercion turns
/// them into [`Value::Bool`]/[`Value::Number`]/[`Value::List`] where possible and
/// leaves them untouched otherwise, so a failing value is always reported the
/// way the user wrote it.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    #[default]
    Undefined,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Object(ConfigValues),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Renders the value for error messages, wrapping strings in double quotes
    pub fn quoted(&self) -> String {
        match self {
            Self::Str(s) => format!("\"{}\"", s),
            other => other.to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n == 0.0 {
        // -0 prints as 0
        return "0".to_string();
    }
    format!("{}", n)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Str(s) => write!(f, "{}", s),
            Self::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Self::Undefined => String::new(),
                        other => other.to_string(),
                    })
                    .collect();
                write!(f, "{}", parts.join(","))
            }
            Self::Object(_) => write!(f, "[object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

macro_rules! number_into_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}

number_into_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Result of a best-effort coercion: either the typed value or the raw text it came from
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Coerced(T),
    Raw(String),
}

impl<T: Into<Value>> Coerced<T> {
    pub fn into_value(self) -> Value {
        match self {
            Self::Coerced(value) => value.into(),
            Self::Raw(raw) => Value::Str(raw),
        }
    }
}

/// Converts a validated [`Value`] into a typed field
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;

    /// Range the type can represent, used as default `(min, max)` bounds
    fn implied_bounds() -> (Option<f64>, Option<f64>) {
        (None, None)
    }
}

/// A string-valued enumeration usable as an `enumeration` field
///
/// Only string values are supported. Every variant is identified by exactly one
/// env value, so there is no way for a variant name to be accepted in place of
/// its value.
pub trait EnvEnum: Sized + 'static {
    /// Accepted env values in declaration order
    const VALUES: &'static [&'static str];

    fn from_env_value(value: &str) -> Option<Self>;

    fn as_env_value(&self) -> &'static str;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_number()
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_number().map(|n| n as f32)
    }
}

/// Largest `f64` that does not exceed `max`
///
/// `i64::MAX as f64` rounds up to 2^63, which no `i64` holds.
fn exact_upper_bound(max: i128) -> f64 {
    let bound = max as f64;
    if bound as i128 > max {
        f64::from_bits(bound.to_bits() - 1)
    } else {
        bound
    }
}

macro_rules! integer_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    let n = value.as_number()?;
                    if n.fract() != 0.0 {
                        return None;
                    }
                    <$ty>::try_from(n as i128).ok()
                }

                fn implied_bounds() -> (Option<f64>, Option<f64>) {
                    (Some(<$ty>::MIN as f64), Some(exact_upper_bound(<$ty>::MAX as i128)))
                }
            }
        )*
    };
}

integer_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Undefined => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn implied_bounds() -> (Option<f64>, Option<f64>) {
        T::implied_bounds()
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn implied_bounds() -> (Option<f64>, Option<f64>) {
        T::implied_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_numbers_like_written() {
        assert_eq!(Value::Number(9.0001).to_string(), "9.0001");
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-243.31).to_string(), "-243.31");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
    }

    #[test]
    fn test_display_undefined_and_list() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        let list = Value::List(vec![
            Value::Number(1.0),
            Value::Str("abc".into()),
            Value::Undefined,
        ]);
        assert_eq!(list.to_string(), "1,abc,");
    }

    #[test]
    fn test_quoted_only_wraps_strings() {
        assert_eq!(Value::Str("bad".into()).quoted(), "\"bad\"");
        assert_eq!(Value::Number(1.1).quoted(), "1.1");
        assert_eq!(Value::Bool(true).quoted(), "true");
        assert_eq!(Value::Undefined.quoted(), "undefined");
    }

    #[test]
    fn test_coerced_into_value() {
        assert_eq!(Coerced::Coerced(true).into_value(), Value::Bool(true));
        assert_eq!(
            Coerced::<bool>::Raw("haha".into()).into_value(),
            Value::Str("haha".into())
        );
    }

    #[test]
    fn test_integer_from_value_rejects_fraction_and_overflow() {
        assert_eq!(u16::from_value(&Value::Number(8080.0)), Some(8080));
        assert_eq!(u16::from_value(&Value::Number(70000.0)), None);
        assert_eq!(i32::from_value(&Value::Number(9.5)), None);
        assert_eq!(i32::from_value(&Value::Str("9".into())), None);
    }

    #[test]
    fn test_option_and_vec_from_value() {
        assert_eq!(Option::<bool>::from_value(&Value::Undefined), Some(None));
        assert_eq!(
            Option::<bool>::from_value(&Value::Bool(false)),
            Some(Some(false))
        );
        let list = Value::List(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(Vec::<i64>::from_value(&list), Some(vec![1, 2]));
        assert_eq!(Vec::<i64>::from_value(&Value::Number(1.0)), None);
    }

    #[test]
    fn test_implied_bounds() {
        assert_eq!(u8::implied_bounds(), (Some(0.0), Some(255.0)));
        assert_eq!(Option::<u8>::implied_bounds(), (Some(0.0), Some(255.0)));
        assert_eq!(f64::implied_bounds(), (None, None));
    }

    #[test]
    fn test_64_bit_upper_bound_converts() {
        let i64_max = i64::implied_bounds().1.unwrap();
        assert!(i64_max < 9.223372036854776e18);
        assert!(i64::from_value(&Value::Number(i64_max)).is_some());

        let u64_max = u64::implied_bounds().1.unwrap();
        assert!(u64_max < 18446744073709551615.0);
        assert!(u64::from_value(&Value::Number(u64_max)).is_some());

        assert_eq!(i64::from_value(&Value::Number(9.223372036854776e18)), None);
        assert_eq!(i64::implied_bounds().0, Some(i64::MIN as f64));
    }
}
