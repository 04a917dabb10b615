// Helpers called by the code `define_config!` and `define_enum!` generate.
// The macros themselves live in the envfile-loadr-macros crate.

use crate::{
    error::ConfigError,
    schema::{Schema, SchemaError},
    value::{ConfigValues, FromValue, Value},
};

/// Read one validated property into its Rust type
#[doc(hidden)]
pub fn field_value<T: FromValue>(values: &ConfigValues, property: &str) -> Result<T, ConfigError> {
    let value = values.get(property).unwrap_or(&Value::Undefined);
    T::from_value(value).ok_or_else(|| ConfigError::Conversion {
        property: property.to_string(),
        type_name: std::any::type_name::<T>(),
    })
}

/// Unwrap a generated schema; an invalid declaration is a bug in the calling crate
#[doc(hidden)]
pub fn expect_schema(result: Result<Schema, SchemaError>) -> Schema {
    match result {
        Ok(schema) => schema,
        Err(e) => panic!("invalid config schema: {}", e),
    }
}
