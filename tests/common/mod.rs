#![allow(dead_code)]

use envfile_loadr::{ConfigError, EnvSchema, LoadOptions};
use std::{fmt::Debug, io::Write};
use tempfile::NamedTempFile;

/// Strip the indentation of every line and drop blank lines
pub fn trim_each_line(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `content` to a temporary env file
pub fn env_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(trim_each_line(content).as_bytes()).unwrap();
    file
}

pub fn load_with<T: EnvSchema>(content: &str, options: LoadOptions) -> Result<T, ConfigError> {
    let file = env_file(content);
    T::load_with(&options.env_file(file.path()))
}

pub fn load<T: EnvSchema>(content: &str) -> Result<T, ConfigError> {
    load_with(content, LoadOptions::new())
}

pub fn expect_env_error_with<T: EnvSchema + Debug>(
    content: &str,
    options: LoadOptions,
    expected_message: &str,
) {
    match load_with::<T>(content, options) {
        Err(ConfigError::Invalid(error)) => {
            assert_eq!(error.to_string(), trim_each_line(expected_message))
        }
        Err(other) => panic!("expected config validation error, got: {}", other),
        Ok(config) => panic!(
            "Expected config validation error, however it succeed: {:?}",
            config
        ),
    }
}

pub fn expect_env_error<T: EnvSchema + Debug>(content: &str, expected_message: &str) {
    expect_env_error_with::<T>(content, LoadOptions::new(), expected_message)
}
