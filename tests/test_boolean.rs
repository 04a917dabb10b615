mod common;

use common::{expect_env_error, load};
use envfile_loadr::define_config;

define_config! {
    #[derive(Debug, PartialEq)]
    #[allow(non_snake_case)]
    struct RequiredBooleans {
        #[field(boolean)]
        BOOL_T: bool,
        #[field(boolean)]
        BOOL_F: bool,
        #[field(boolean)]
        BOOL_1: bool,
        #[field(boolean)]
        BOOL_0: bool,
    }
}

#[test]
fn test_required_success() {
    let config: RequiredBooleans = load(
        "
        BOOL_T=true
        BOOL_F=false
        BOOL_1=1
        BOOL_0=0
        ",
    )
    .unwrap();

    assert_eq!(
        config,
        RequiredBooleans {
            BOOL_T: true,
            BOOL_F: false,
            BOOL_1: true,
            BOOL_0: false,
        }
    );
}

define_config! {
    #[derive(Debug, PartialEq)]
    #[allow(non_snake_case)]
    struct OptionalBooleans {
        #[field(boolean, optional)]
        OPT_BOOL_T: Option<bool>,
        #[field(boolean, optional)]
        OPT_BOOL_0: Option<bool>,
        #[field(boolean, optional)]
        OPT_BOOL_MISSING: Option<bool>,
        #[field(boolean, optional, default = true)]
        OPT_BOOL_DEFAULT_TRUE__MISSING: bool,
        #[field(boolean, optional, default = false)]
        OPT_BOOL_DEFAULT_FALSE__MISSING: bool,
        #[field(boolean, optional, default = true)]
        OPT_BOOL__DEFAULT_TRUE__OVERRIDED_FALSE: bool,
        #[field(boolean, optional, default = false)]
        OPT_BOOL__DEFAULT_FALSE__OVERRIDED_TRUE: bool,
    }
}

#[test]
fn test_optional_success() {
    let config: OptionalBooleans = load(
        "
        OPT_BOOL_T=true
        OPT_BOOL_0=0
        # OPT_BOOL_MISSING
        OPT_BOOL__DEFAULT_TRUE__OVERRIDED_FALSE=0
        OPT_BOOL__DEFAULT_FALSE__OVERRIDED_TRUE=true
        ",
    )
    .unwrap();

    assert_eq!(
        config,
        OptionalBooleans {
            OPT_BOOL_T: Some(true),
            OPT_BOOL_0: Some(false),
            OPT_BOOL_MISSING: None,
            OPT_BOOL_DEFAULT_TRUE__MISSING: true,
            OPT_BOOL_DEFAULT_FALSE__MISSING: false,
            OPT_BOOL__DEFAULT_TRUE__OVERRIDED_FALSE: false,
            OPT_BOOL__DEFAULT_FALSE__OVERRIDED_TRUE: true,
        }
    );
}

define_config! {
    #[derive(Debug)]
    #[allow(non_snake_case)]
    struct BrokenBooleans {
        #[field(boolean)]
        BOOL_OK: bool,
        #[field(boolean)]
        BOOL__MISSING: bool,
        #[field(boolean, optional)]
        OPT_BOOL__MISSING: Option<bool>,
        #[field(boolean, optional)]
        OPT_BOOL__INVALID: Option<bool>,
    }
}

#[test]
fn test_basic_error() {
    expect_env_error::<BrokenBooleans>(
        "
        BOOL_OK=true
        OPT_BOOL__INVALID=haha
        ",
        r#"Invalid environment variables provided:
        - BOOL__MISSING (Actual value=undefined): must be one of accepted boolean values=[true, false, 1, 0].
        - OPT_BOOL__INVALID (Actual value="haha") is optional but if set then: must be one of accepted boolean values=[true, false, 1, 0].
        "#,
    );
}

define_config! {
    #[derive(Debug, PartialEq)]
    #[allow(non_snake_case)]
    struct MappedBooleans {
        #[field(boolean)]
        NO_MAP: bool,
        #[field(boolean, env = "B")]
        A: bool,
        #[field(boolean, env = "A")]
        B: bool,
        #[field(boolean, env = "NO_MAP", optional)]
        OPT_A: Option<bool>,
        #[field(boolean, optional)]
        OPT_B: Option<bool>,
    }
}

#[test]
fn test_key_mappings_success() {
    let config: MappedBooleans = load(
        "
        NO_MAP=true
        A=true
        B=false
        OPT_B=false
        ",
    )
    .unwrap();

    assert_eq!(
        config,
        MappedBooleans {
            NO_MAP: true,
            A: false,
            B: true,
            OPT_A: Some(true),
            OPT_B: Some(false),
        }
    );
}

define_config! {
    #[derive(Debug)]
    #[allow(non_snake_case)]
    struct MappedMissingBooleans {
        #[field(boolean)]
        NO_MAP: bool,
        #[field(boolean, env = "B")]
        A: bool,
    }
}

#[test]
fn test_key_mappings_error_message() {
    expect_env_error::<MappedMissingBooleans>(
        "",
        "Invalid environment variables provided:
        - NO_MAP (Actual value=undefined): must be one of accepted boolean values=[true, false, 1, 0].
        - B mapped to config A (Actual value=undefined): must be one of accepted boolean values=[true, false, 1, 0].",
    );
}
