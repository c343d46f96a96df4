//! End-to-end validation scenarios through the public prelude.

use pretty_assertions::assert_eq;
use serde_json::json;
use warden_validator::prelude::*;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

// ============================================================================
// OBJECTS
// ============================================================================

#[test]
fn object_reports_every_field_error() {
    let schema = object! {
        name: string().min(1),
        age: number().int().min(0.0),
    };
    let errors = schema.validate(&v(json!({"name": "", "age": -1}))).unwrap_err();

    assert_eq!(errors.len(), 2);
    assert_eq!(errors.as_slice()[0].path, "name");
    assert_eq!(errors.as_slice()[0].code, ErrorCode::StringTooShort);
    assert_eq!(errors.as_slice()[1].path, "age");
    assert_eq!(errors.as_slice()[1].code, ErrorCode::NumberTooSmall);
}

#[test]
fn builders_construct_without_the_macro() {
    let schema = object([("id", Schema::from(number().int())), ("tag", string().into())]);
    assert!(schema.is(&v(json!({"id": 1, "tag": "a"}))));

    let defaults = [
        Schema::from(string()),
        number().into(),
        bigint().into(),
        date().into(),
        object([("x", boolean())]).into(),
    ];
    assert!(defaults.iter().all(|schema| !schema.is(&Value::Null)));
}

#[test]
fn nested_paths_are_dot_joined() {
    let schema = object! {
        user: object! {
            roles: array(enumeration(["admin", "user"])),
        },
    };
    let errors = schema
        .validate(&v(json!({"user": {"roles": ["root"]}})))
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path, "user.roles.0");
    assert_eq!(errors.first().code, ErrorCode::InvalidEnumValue);
}

#[test]
fn unknown_keys_are_stripped_by_default() {
    let schema = object! { id: number() };
    let output = schema.parse(&v(json!({"id": 1, "extra": true}))).unwrap();
    assert_eq!(output, v(json!({"id": 1})));
}

#[test]
fn strict_objects_reject_unknown_keys() {
    let schema = object! { id: number() }.strict();
    let errors = schema.validate(&v(json!({"id": 1, "extra": true}))).unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::ObjectUnknownKey);
    assert_eq!(errors.first().path, "extra");
}

#[test]
fn optional_fields_may_be_absent() {
    let schema = object! {
        name: string(),
        nickname: string().optional(),
    };
    assert!(schema.is(&v(json!({"name": "ada"}))));
    assert!(!schema.is(&v(json!({"nickname": "a"}))));
}

#[test]
fn defaults_fill_absent_fields() {
    let schema = object! {
        page: number().int().default(1),
    };
    assert_eq!(schema.parse(&v(json!({}))), Ok(v(json!({"page": 1}))));
}

// ============================================================================
// UNIONS
// ============================================================================

#[test]
fn union_without_match_reports_once() {
    let schema = union([Schema::from(string()), Schema::from(number())]);
    let errors = schema.validate(&Value::from(true)).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().code, ErrorCode::UnionNoMatch);
}

#[test]
fn discriminated_union_selects_by_tag() {
    let schema = discriminated_union(
        "type",
        [
            object! { "type": literal("a"), v: string() },
            object! { "type": literal("b"), v: number() },
        ],
    )
    .unwrap();

    let input = v(json!({"type": "b", "v": 42}));
    assert_eq!(schema.parse(&input), Ok(v(json!({"type": "b", "v": 42}))));

    let errors = schema.validate(&v(json!({"type": "c"}))).unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::InvalidDiscriminator);
    assert_eq!(errors.first().path, "type");
}

#[test]
fn discriminated_union_rejects_duplicate_tags() {
    let result = discriminated_union(
        "type",
        [
            object! { "type": literal("a") },
            object! { "type": literal("a") },
        ],
    );
    assert!(matches!(result, Err(SchemaError::DuplicateDiscriminator { .. })));
}

// ============================================================================
// ARRAYS AND COLLECTIONS
// ============================================================================

#[test]
fn array_min_length() {
    let schema = array(number()).min(2);
    let errors = schema.validate(&v(json!([1]))).unwrap_err();
    assert_eq!(errors.codes(), vec![ErrorCode::ArrayTooShort]);
}

#[test]
fn array_reports_each_bad_element() {
    let schema = array(number());
    let errors = schema.validate(&v(json!([1, "x", 3, null]))).unwrap_err();
    let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["1", "3"]);
}

#[test]
fn tuple_with_rest() {
    let schema = tuple([Schema::from(string()), Schema::from(number())]).rest(boolean());
    assert!(schema.is(&v(json!(["a", 1, true, false]))));
    let errors = schema.validate(&v(json!(["a", 1, "no"]))).unwrap_err();
    assert_eq!(errors.first().path, "2");
    assert_eq!(errors.first().code, ErrorCode::NotBoolean);
}

#[test]
fn record_validates_every_value() {
    let schema = record(number().nonnegative());
    assert!(schema.is(&v(json!({"a": 1, "b": 2}))));
    let errors = schema.validate(&v(json!({"a": 1, "b": -2}))).unwrap_err();
    assert_eq!(errors.first().path, "b");
}

#[test]
fn map_and_set_values() {
    let pairs = map(string(), number());
    assert!(pairs.is(&Value::map([("a", 1), ("b", 2)])));
    let errors = pairs.validate(&Value::map([("a", "x")])).unwrap_err();
    assert_eq!(errors.first().path, "0.value");

    let tags = set(string()).max(2);
    assert!(tags.is(&Value::set(["a", "b", "a"])));
    assert_eq!(
        tags.validate(&Value::set(["a", "b", "c"])).unwrap_err().first().code,
        ErrorCode::SetTooBig
    );
}

// ============================================================================
// INTERSECTIONS AND MODIFIERS
// ============================================================================

#[test]
fn intersection_merges_object_outputs() {
    let schema = object! { a: string() }.passthrough().and(object! { b: number() }.passthrough());
    let input = v(json!({"a": "x", "b": 1}));
    assert_eq!(schema.parse(&input), Ok(v(json!({"a": "x", "b": 1}))));
}

#[test]
fn refine_and_transform_chain() {
    let schema = string()
        .trim()
        .refine(|v| v.as_str().is_some_and(|s| !s.contains(' ')), "No spaces")
        .transform(|v| Value::from(v.as_str().map_or(0, str::len)));

    assert_eq!(schema.parse(&Value::from("  slug ")), Ok(Value::from(4)));

    let errors = schema.validate(&Value::from("two words")).unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::RefinementFailed);
    assert_eq!(errors.first().message, "No spaces");
}

#[test]
fn catch_replaces_failures() {
    let schema = number().catch(0);
    assert_eq!(schema.parse(&Value::from("nope")), Ok(Value::from(0)));
}

#[test]
fn pipe_validates_the_transformed_output() {
    let schema = string()
        .transform(|v| Value::from(v.as_str().map_or(0, str::len)))
        .pipe(number().max(3.0));
    assert!(schema.is(&Value::from("abc")));
    let errors = schema.validate(&Value::from("abcd")).unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::NumberTooBig);
}

#[test]
fn lazy_schemas_recurse() {
    fn category() -> Schema {
        object! {
            name: string(),
            children: array(lazy(category)),
        }
        .into()
    }

    let schema = category();
    let tree = v(json!({
        "name": "root",
        "children": [
            {"name": "a", "children": []},
            {"name": "b", "children": [{"name": 3, "children": []}]},
        ],
    }));
    let errors = schema.validate(&tree).unwrap_err();
    assert_eq!(errors.first().path, "children.1.children.0.name");
    assert_eq!(errors.first().code, ErrorCode::NotString);
}

// ============================================================================
// COMPILER
// ============================================================================

#[test]
fn compiled_validator_agrees_with_schema() {
    let schema = object! { e: string().email() };
    let compiled = compile(schema.clone());
    let input = v(json!({"e": "x"}));

    assert!(!compiled.is(&input));
    assert_eq!(compiled.validate(&input), schema.validate(&input));
    assert!(compiled.is(&v(json!({"e": "ada@example.com"}))));
}

// ============================================================================
// ERROR SERIALIZATION
// ============================================================================

#[test]
fn errors_serialize_with_wire_codes() {
    let schema = object! { age: number() };
    let errors = schema.validate(&v(json!({"age": "x"}))).unwrap_err();
    let json = serde_json::to_value(&errors).unwrap();
    assert_eq!(json[0]["path"], json!("age"));
    assert_eq!(json[0]["code"], json!("NOT_NUMBER"));
}
