pub mod coerce;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod field;
pub mod loader;
pub mod macros;
pub mod mapper;
pub mod registry;
pub mod schema;
pub mod value;

// Re-export main types
pub use error::{ConfigError, EnvError, ErrorDetail};
pub use field::{Field, FieldKind, FieldSpec};
pub use loader::{load_values, load_values_from_raw, LoadOptions};
pub use mapper::RawEnv;
pub use registry::{FieldMapping, MappingRegistry};
pub use schema::{Schema, SchemaBuilder, SchemaError};
pub use value::{Coerced, ConfigValues, EnvEnum, FromValue, Value};

// Re-export macros
pub use envfile_loadr_macros::{define_config, define_enum};

#[doc(hidden)]
pub mod __private {
    pub use crate::macros::{expect_schema, field_value};
    pub use std::sync::OnceLock;
}

/// A typed config struct backed by a [`Schema`]
///
/// Implemented by [`define_config!`]; the provided methods load the env file,
/// validate it and convert the result.
pub trait EnvSchema: Sized {
    /// Descriptor of the struct, built once
    fn schema() -> &'static Schema;

    /// Convert validated values into the struct
    fn from_values(values: &ConfigValues) -> Result<Self, ConfigError>;

    /// Load from the env file with default options
    fn load() -> Result<Self, ConfigError> {
        Self::load_with(&LoadOptions::default())
    }

    fn load_with(options: &LoadOptions) -> Result<Self, ConfigError> {
        let values = load_values(Self::schema(), options)?;
        Self::from_values(&values)
    }

    /// Validate `.env` formatted text instead of reading a file
    fn load_from_str(content: &str, options: &LoadOptions) -> Result<Self, ConfigError> {
        let raw = loader::parse_env_str(content)?;
        let values = load_values_from_raw(Self::schema(), &raw, options)?;
        Self::from_values(&values)
    }

    /// Load with default options, panicking with a readable report on failure
    fn load_or_panic() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(ConfigError::Invalid(e)) => panic!("{}", e.colored_report()),
            Err(e) => panic!("{}", e),
        }
    }

    /// Write the Markdown table of every variable the struct reads
    fn write_docs(path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        Self::schema().write_docs(path)
    }
}
