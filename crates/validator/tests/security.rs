//! Guards against adversarial input: dangerous keys, deep nesting and regex
//! abuse.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use warden_validator::prelude::*;
use warden_validator::security::DANGEROUS_KEYS;

fn nested(levels: usize) -> Value {
    let mut value = Value::object(Vec::<(&str, Value)>::new());
    for _ in 0..levels {
        value = Value::object([("child", value)]);
    }
    value
}

fn tree() -> Schema {
    object! { child: lazy(tree).optional() }.into()
}

// ============================================================================
// OBJECT GUARD
// ============================================================================

#[rstest]
#[case::strip(object! { id: number() })]
#[case::passthrough(object! { id: number() }.passthrough())]
#[case::strict(object! { id: number() }.strict())]
fn proto_key_is_rejected_in_every_mode(#[case] schema: ObjectSchema) {
    let input = Value::from(json!({"id": 1, "__proto__": {"admin": true}}));
    let errors = schema.validate(&input).unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::SecurityDangerousKey);
    assert_eq!(errors.first().path, "");
    assert!(!schema.is(&input));
}

#[test]
fn every_dangerous_key_is_rejected() {
    let schema = record(unknown());
    for key in DANGEROUS_KEYS {
        let input = Value::object([(*key, Value::Null)]);
        let errors = schema.validate(&input).unwrap_err();
        assert_eq!(errors.codes(), vec![ErrorCode::SecurityDangerousKey], "key {key}");
    }
}

#[test]
fn passthrough_scans_copied_values() {
    let schema = object! { id: number() }.passthrough();
    let input = Value::from(json!({"id": 1, "extra": {"nested": {"constructor": 1}}}));
    let errors = schema.validate(&input).unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::SecurityDangerousKey);
    assert_eq!(errors.first().path, "extra.nested");
}

#[test]
fn deep_recursion_is_bounded() {
    let schema = tree();
    let input = nested(100);

    let errors = schema.validate(&input).unwrap_err();
    assert_eq!(errors.codes(), vec![ErrorCode::SecurityMaxDepth]);
    assert!(!schema.is(&input));

    assert!(schema.is(&nested(SecurityLimits::DEFAULT_MAX_DEPTH)));
}

#[test]
fn depth_limit_is_configurable() {
    let schema = object! { inner: object! { leaf: number() } }
        .limits(SecurityLimits::default().with_max_depth(0));
    assert!(schema.is(&Value::from(json!({"inner": {"leaf": 1}}))));

    let shallow = object! { leaf: number() }.limits(SecurityLimits::default().with_max_depth(0));
    let errors = object! { inner: shallow }
        .validate(&Value::from(json!({"inner": {"leaf": 1}})))
        .unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::SecurityMaxDepth);
    assert_eq!(errors.first().path, "inner");
}

#[test]
fn limits_deserialize_with_defaults() {
    let limits: SecurityLimits = serde_json::from_str(r#"{ "max_depth": 16 }"#).unwrap();
    assert_eq!(limits.max_depth, 16);
    assert_eq!(
        limits.max_regex_input_len,
        SecurityLimits::DEFAULT_MAX_REGEX_INPUT_LEN
    );
}

// ============================================================================
// REGEX GUARD
// ============================================================================

#[test]
fn oversized_regex_input_is_refused() {
    let schema = string().regex(GuardedRegex::new("^a+$").unwrap());
    let errors = schema.validate(&Value::from("a".repeat(20_000))).unwrap_err();
    assert_eq!(errors.codes(), vec![ErrorCode::SecurityInputTooLong]);
}

#[rstest]
#[case::nested_quantifier("(a+)+$")]
#[case::nested_star("(a*)*b")]
#[case::backreference(r"(a)\1")]
fn risky_patterns_never_run(#[case] pattern: &str) {
    let re = GuardedRegex::new(pattern).unwrap();
    assert!(re.risk().is_some());
    let errors = string().regex(re).validate(&Value::from("aaaa")).unwrap_err();
    assert_eq!(errors.codes(), vec![ErrorCode::SecurityUnsafePattern]);
}

#[test]
fn safe_patterns_still_match() {
    let schema = string().regex(GuardedRegex::new("^[a-z]+-[0-9]+$").unwrap());
    assert!(schema.is(&Value::from("build-42")));
    assert_eq!(
        schema.validate(&Value::from("build")).unwrap_err().first().code,
        ErrorCode::StringPatternMismatch
    );
}
