use crate::{
    engine::{instantiate, transform_and_validate, ValidatorOptions},
    error::{ConfigError, EnvError},
    mapper::{map_env, RawEnv},
    schema::Schema,
    value::ConfigValues,
};
use std::{
    env,
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Process variable that overrides the env file path
pub const ENV_FILE_VAR: &str = "ENV_FILE";

/// Env file read from the current directory when nothing else is configured
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Options for a single load
///
/// # Example
/// ```rust
/// use envfile_loadr::LoadOptions;
///
/// let options = LoadOptions::new().allow_unknown(true).env_file("config/dev.env");
/// assert!(options.allow_unknown);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Let the env file contain variables the schema does not declare
    pub allow_unknown: bool,
    /// Explicit env file, takes precedence over `ENV_FILE`
    pub env_file: Option<PathBuf>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_unknown(mut self, allow_unknown: bool) -> Self {
        self.allow_unknown = allow_unknown;
        self
    }

    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }
}

/// Path of the env file to load
///
/// Relative paths (from the options or `ENV_FILE`) are resolved against the
/// current working directory.
pub fn resolve_env_file_path(options: &LoadOptions) -> Result<PathBuf, ConfigError> {
    let configured = options.env_file.clone().or_else(|| {
        env::var_os(ENV_FILE_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    });

    if let Some(path) = &configured {
        if path.is_absolute() {
            return Ok(path.clone());
        }
    }

    let cwd = env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;

    Ok(cwd.join(configured.unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))))
}

fn location_error(path: &Path, source: io::Error) -> ConfigError {
    match source.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Read the raw text of the env file at `path`
///
/// Checks run in order: existence, read permission, not a directory.
pub fn read_env_file(path: &Path) -> Result<String, ConfigError> {
    let metadata = fs::metadata(path).map_err(|e| location_error(path, e))?;
    let mut file = File::open(path).map_err(|e| location_error(path, e))?;

    if metadata.is_dir() {
        return Err(ConfigError::IsADirectory(path.to_path_buf()));
    }

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| location_error(path, e))?;
    Ok(content)
}

/// Quoting state of the `.env` text, tracked the way dotenvy splits lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Complete,
    Whitespace,
    Escape,
    Weak,
    WeakEscape,
    Strong,
    Comment,
}

impl Lexeme {
    fn next(self, c: char) -> Self {
        match self {
            Self::Whitespace => match c {
                '#' => Self::Comment,
                '\\' => Self::Escape,
                '"' => Self::Weak,
                '\'' => Self::Strong,
                _ => Self::Complete,
            },
            Self::Complete => match c {
                '\\' => Self::Escape,
                '"' => Self::Weak,
                '\'' => Self::Strong,
                c if c.is_whitespace() && c != '\n' && c != '\r' => Self::Whitespace,
                _ => Self::Complete,
            },
            Self::Escape => Self::Complete,
            Self::Weak => match c {
                '\\' => Self::WeakEscape,
                '"' => Self::Complete,
                _ => Self::Weak,
            },
            Self::WeakEscape => Self::Weak,
            Self::Strong if c == '\'' => Self::Complete,
            Self::Strong => Self::Strong,
            Self::Comment if c == '\n' => Self::Complete,
            Self::Comment => Self::Comment,
        }
    }

    /// dotenvy starts a `$NAME` substitution here
    fn substitutes(self) -> bool {
        matches!(self, Self::Complete | Self::Whitespace | Self::Weak)
    }
}

/// Escape every `$` dotenvy would expand, so values are read literally and
/// the process environment never leaks into the config.
fn escape_substitutions(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    let mut state = Lexeme::Complete;

    for line in content.split_inclusive('\n') {
        if state == Lexeme::Complete && line.trim_start().starts_with('#') {
            escaped.push_str(line);
            continue;
        }
        for c in line.chars() {
            if c == '$' && state.substitutes() {
                escaped.push('\\');
            }
            escaped.push(c);
            state = state.next(c);
        }
    }

    escaped
}

/// Parse `.env` syntax into raw variables in file order
///
/// Values are taken literally: `$NAME` and `${NAME}` are not expanded. A later
/// duplicate key replaces the value but keeps its first position.
pub fn parse_env_str(content: &str) -> Result<RawEnv, ConfigError> {
    let mut raw = RawEnv::new();
    let literal = escape_substitutions(content);
    for item in dotenvy::from_read_iter(literal.as_bytes()) {
        let (key, value) = item?;
        raw.insert(key, value);
    }
    Ok(raw)
}

/// Locate, read and parse the env file, then validate it against `schema`
pub fn load_values(schema: &Schema, options: &LoadOptions) -> Result<ConfigValues, ConfigError> {
    let path = resolve_env_file_path(options)?;
    debug!(path = %path.display(), "resolved env file");

    let content = read_env_file(&path)?;
    let raw = parse_env_str(&content)?;
    debug!(variables = raw.len(), "parsed env file");

    load_values_from_raw(schema, &raw, options)
}

/// Validate already parsed variables against `schema`
pub fn load_values_from_raw(
    schema: &Schema,
    raw: &RawEnv,
    options: &LoadOptions,
) -> Result<ConfigValues, ConfigError> {
    let mapped = map_env(raw, schema);
    let instance = instantiate(schema, mapped);
    let validator_options = ValidatorOptions {
        forbid_unknown: !options.allow_unknown,
    };

    match transform_and_validate(schema, instance, validator_options) {
        Ok(values) => {
            debug!(schema = schema.name(), "config loaded");
            Ok(values)
        }
        Err(failures) => {
            debug!(
                schema = schema.name(),
                failures = failures.len(),
                "config validation failed"
            );
            Err(EnvError::from_failures(&failures).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::FieldSpec, value::Value};
    use serial_test::serial;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn env_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn schema() -> Schema {
        Schema::builder("EnvSchema")
            .field(FieldSpec::string("KNOWN"))
            .field(FieldSpec::int("PORT").optional().default(8080))
            .build()
            .unwrap()
    }

    #[test]
    fn test_explicit_env_file_wins() {
        let file = env_file("KNOWN=ok\n");
        let options = LoadOptions::new().env_file(file.path());

        assert_eq!(resolve_env_file_path(&options).unwrap(), file.path());

        let values = load_values(&schema(), &options).unwrap();
        assert_eq!(values["KNOWN"], Value::Str("ok".into()));
        assert_eq!(values["PORT"], Value::Number(8080.0));
    }

    #[test]
    #[serial]
    fn test_env_file_var_absolute() {
        let file = env_file("KNOWN=from-var\nPORT=81\n");
        env::set_var(ENV_FILE_VAR, file.path());

        let result = load_values(&schema(), &LoadOptions::default());
        env::remove_var(ENV_FILE_VAR);

        let values = result.unwrap();
        assert_eq!(values["KNOWN"], Value::Str("from-var".into()));
        assert_eq!(values["PORT"], Value::Number(81.0));
    }

    #[test]
    #[serial]
    fn test_relative_path_resolves_against_cwd() {
        env::remove_var(ENV_FILE_VAR);
        let cwd = env::current_dir().unwrap();

        let options = LoadOptions::new().env_file("config/dev.env");
        assert_eq!(
            resolve_env_file_path(&options).unwrap(),
            cwd.join("config/dev.env")
        );
        assert_eq!(
            resolve_env_file_path(&LoadOptions::default()).unwrap(),
            cwd.join(DEFAULT_ENV_FILE)
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.env");

        let err = read_env_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(ref p) if p == &path));
        assert!(err
            .to_string()
            .starts_with("Configuration file does not exist or is not visible to your process"));
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = TempDir::new().unwrap();

        let err = read_env_file(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IsADirectory(_)));
    }

    #[test]
    fn test_parse_env_str() {
        let raw = parse_env_str("A=1\n# comment\nB=\"  spaced  \"\nC=  trimmed  \n").unwrap();

        assert_eq!(raw["A"], "1");
        assert_eq!(raw["B"], "  spaced  ");
        assert_eq!(raw["C"], "trimmed");
    }

    #[test]
    #[serial]
    fn test_parse_env_str_does_not_substitute() {
        env::set_var("ENVFILE_LOADR_TOKEN", "LEAKED");
        let raw = parse_env_str(
            "A=pa$ENVFILE_LOADR_TOKEN\nB=\"x${ENVFILE_LOADR_TOKEN}\"\nC=a$b\nD='s$b'\nE=c\\$d\nF=\"q\\$\"\n",
        );
        env::remove_var("ENVFILE_LOADR_TOKEN");

        let raw = raw.unwrap();
        assert_eq!(raw["A"], "pa$ENVFILE_LOADR_TOKEN");
        assert_eq!(raw["B"], "x${ENVFILE_LOADR_TOKEN}");
        assert_eq!(raw["C"], "a$b");
        assert_eq!(raw["D"], "s$b");
        assert_eq!(raw["E"], "c$d");
        assert_eq!(raw["F"], "q$");
    }

    #[test]
    fn test_escape_substitutions() {
        assert_eq!(escape_substitutions("A=$B\n"), "A=\\$B\n");
        assert_eq!(escape_substitutions("A='$B'\n"), "A='$B'\n");
        assert_eq!(escape_substitutions("# cost $5\nA=1"), "# cost $5\nA=1");
        assert_eq!(escape_substitutions("A=1 # $x\nB=$y"), "A=1 # $x\nB=\\$y");
        assert_eq!(escape_substitutions("A='multi\n$line'\nB=$c"), "A='multi\n$line'\nB=\\$c");
    }

    #[test]
    fn test_parse_env_str_keeps_file_order() {
        let raw = parse_env_str("B=1\nA=2\nB=3\n").unwrap();

        let keys: Vec<_> = raw.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(raw["B"], "3");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;

        let file = env_file("KNOWN=ok\n");
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o000)).unwrap();

        // root reads the file regardless of its mode
        if File::open(file.path()).is_ok() {
            return;
        }

        let err = read_env_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::PermissionDenied(ref p) if p == file.path()));
        assert_eq!(
            err.to_string(),
            format!(
                "Process does not have permissions to read file: \"{}\"",
                file.path().display()
            )
        );
    }

    #[test]
    fn test_parse_error_is_returned() {
        let err = parse_env_str("THIS IS NOT VALID\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_values_from_raw_aggregates() {
        let raw: RawEnv = [("PORT".to_string(), "x".to_string())].into_iter().collect();

        let err = load_values_from_raw(&schema(), &raw, &LoadOptions::default()).unwrap_err();
        let ConfigError::Invalid(env_error) = err else {
            panic!("expected validation error");
        };
        assert_eq!(env_error.details.len(), 2);
        assert_eq!(env_error.details[0].env_name, "KNOWN");
        assert_eq!(env_error.details[1].env_name, "PORT");
    }
}
