mod common;

use common::{expect_env_error, expect_env_error_with, load, load_with};
use envfile_loadr::{
    define_config, load_values_from_raw, ConfigError, LoadOptions, RawEnv, Value,
};

define_config! {
    #[derive(Debug, PartialEq)]
    #[allow(non_snake_case)]
    struct KnownOnly {
        #[field(string)]
        KNOWN: String,
    }
}

const ENV: &str = "
    KNOWN=ok
    I_AM_UNKNOWN=haha
";

const EXPECTED: &str = r#"Invalid environment variables provided:
    - I_AM_UNKNOWN (Actual value="haha"): it is unexpected environemnt variable. Fix: do not set this env variable OR provide additional option to getConfig(ConfigSchema, { allowUnknown: true }).
"#;

#[test]
fn test_unknown_variable_is_rejected_by_default() {
    expect_env_error::<KnownOnly>(ENV, EXPECTED);
    expect_env_error_with::<KnownOnly>(ENV, LoadOptions::new().allow_unknown(false), EXPECTED);
}

#[test]
fn test_unknown_variable_allowed() {
    let config: KnownOnly = load_with(ENV, LoadOptions::new().allow_unknown(true)).unwrap();
    assert_eq!(
        config,
        KnownOnly {
            KNOWN: "ok".into()
        }
    );
}

#[test]
fn test_unknown_variable_passes_through_untyped() {
    let raw: RawEnv = [
        ("KNOWN".to_string(), "ok".to_string()),
        ("I_AM_UNKNOWN".to_string(), "1".to_string()),
    ]
    .into_iter()
    .collect();

    let values = load_values_from_raw(
        <KnownOnly as envfile_loadr::EnvSchema>::schema(),
        &raw,
        &LoadOptions::new().allow_unknown(true),
    )
    .unwrap();

    assert_eq!(values["KNOWN"], Value::Str("ok".into()));
    assert_eq!(values["I_AM_UNKNOWN"], Value::Str("1".into()));
}

define_config! {
    #[derive(Debug)]
    #[allow(non_snake_case)]
    struct RenamedOnly {
        #[field(boolean, env = "FLAG")]
        flag: bool,
    }
}

#[test]
fn test_unknown_variables_come_first_in_file_order() {
    expect_env_error::<RenamedOnly>(
        "
        ZZZ=1
        AAA=2
        ",
        r#"Invalid environment variables provided:
        - ZZZ (Actual value="1"): it is unexpected environemnt variable. Fix: do not set this env variable OR provide additional option to getConfig(ConfigSchema, { allowUnknown: true }).
        - AAA (Actual value="2"): it is unexpected environemnt variable. Fix: do not set this env variable OR provide additional option to getConfig(ConfigSchema, { allowUnknown: true }).
        - FLAG mapped to config flag (Actual value=undefined): must be one of accepted boolean values=[true, false, 1, 0].
        "#,
    );
}

#[test]
fn test_unknown_variables_after_known_keep_file_order() {
    let err = load::<KnownOnly>(
        "
        KNOWN=ok
        ZZZ=1
        AAA=2
        MMM=3
        ",
    )
    .unwrap_err();

    let ConfigError::Invalid(error) = err else {
        panic!("expected validation error, got: {}", err);
    };
    let names: Vec<_> = error.details.iter().map(|d| d.env_name.as_str()).collect();
    assert_eq!(names, vec!["ZZZ", "AAA", "MMM"]);
}
