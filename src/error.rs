use crate::{engine::FieldFailure, value::Value};
use colored::Colorize;
use regex::Regex;
use std::{path::PathBuf, sync::OnceLock};

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file does not exist or is not visible to your process: \"{}\"", .0.display())]
    FileNotFound(PathBuf),

    #[error("Process does not have permissions to read file: \"{}\"", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Configuration file seems to be a directory, not file: \"{}\"", .0.display())]
    IsADirectory(PathBuf),

    #[error("Failed to access configuration file \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The env file could not be parsed
    #[error(transparent)]
    Parse(#[from] dotenvy::Error),

    #[error(transparent)]
    Invalid(#[from] EnvError),

    /// A validated value does not fit the Rust type of its field
    #[error("config property `{property}` cannot be represented as `{type_name}`")]
    Conversion {
        property: String,
        type_name: &'static str,
    },
}

const UNKNOWN_VARIABLE_MESSAGE: &str = "it is unexpected environemnt variable. Fix: do not set this env variable OR provide additional option to getConfig(ConfigSchema, { allowUnknown: true })";

/// Pushed to [`ErrorDetail::error_message_list`] when the developer declared an invalid default
pub const INVALID_DEFAULT_MARKER: &str = "invalid default value set";

fn unknown_property_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^property (\S+) should not exist$").expect("valid regex"))
}

fn map_if_unknown_property(message: &str) -> String {
    if unknown_property_regex().is_match(message) {
        UNKNOWN_VARIABLE_MESSAGE.to_string()
    } else {
        message.to_string()
    }
}

/// One offending env variable
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ErrorDetail {
    pub env_name: String,
    pub config_name: String,
    pub actual_value: Value,
    pub default_value: Value,
    pub is_optional: bool,
    /// Complete, human readable message about this variable
    pub message: String,
    pub error_message_list: Vec<String>,
}

impl ErrorDetail {
    fn from_failure(failure: &FieldFailure<'_>) -> Self {
        let schema = failure.target;
        let field = schema.field(&failure.property);
        let default_value = field.map(|f| f.default.clone()).unwrap_or_default();
        let is_optional = schema.registry().is_optional(&failure.property);

        let env_name = format!(
            "{}{}",
            failure.scope.env_prefix,
            schema
                .registry()
                .env_name_of(&failure.property)
                .unwrap_or(failure.property.as_str())
        );
        let config_name = format!("{}{}", failure.scope.config_prefix, failure.property);

        let property_prefix = if env_name == config_name {
            env_name.clone()
        } else {
            format!("{} mapped to config {}", env_name, config_name)
        };

        let mut error_message_list: Vec<String> = failure
            .constraints
            .iter()
            .map(|(_, message)| map_if_unknown_property(message))
            .collect();

        let property = format!("{} (Actual value={})", property_prefix, failure.value.quoted());
        let optional = if is_optional {
            " is optional but if set then"
        } else {
            ""
        };
        let all_errors = error_message_list.join(" AND ");

        let message = if !default_value.is_undefined() && default_value == failure.value {
            error_message_list.push(INVALID_DEFAULT_MARKER.to_string());
            format!(
                "{}. It is optional but it defaults to invalid value={} that should be changed by developer in ConfigSchema. For now you can just overwrite it by environment variable. Problem: {}",
                property,
                default_value.quoted(),
                all_errors
            )
        } else {
            format!("{}{}: {}", property, optional, all_errors)
        };

        Self {
            env_name,
            config_name,
            actual_value: failure.value.clone(),
            default_value,
            is_optional,
            message,
            error_message_list,
        }
    }
}

/// Every env variable that failed validation in one load
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct EnvError {
    pub details: Vec<ErrorDetail>,
    pub message: String,
}

impl EnvError {
    pub fn from_failures(failures: &[FieldFailure<'_>]) -> Self {
        let details: Vec<ErrorDetail> = failures.iter().map(ErrorDetail::from_failure).collect();

        let message_details = details
            .iter()
            .map(|detail| format!("- {}.", detail.message))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            message: format!("Invalid environment variables provided:\n{}", message_details),
            details,
        }
    }

    /// Terminal-friendly report of every detail
    pub fn colored_report(&self) -> String {
        let summary = self
            .details
            .iter()
            .map(|detail| {
                let mut line = format!(
                    "  - {}: Invalid value {}",
                    detail.env_name.magenta().bold(),
                    detail.actual_value.quoted().red()
                );
                if detail.env_name != detail.config_name {
                    line.push_str(&format!("\n\tConfig: {}", detail.config_name));
                }
                if detail.is_optional {
                    line.push_str("\n\tOptional: yes");
                }
                if !detail.default_value.is_undefined() {
                    line.push_str(&format!(
                        "\n\tDefault: {}",
                        detail.default_value.quoted().cyan()
                    ));
                }
                for message in &detail.error_message_list {
                    line.push_str(&format!("\n\tProblem: {}", message));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Configuration failed with {} error(s):\n{}",
            self.details.len().to_string().yellow().bold(),
            summary
        )
    }
}
