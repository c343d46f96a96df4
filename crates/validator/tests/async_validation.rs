//! Async refinements and transforms.

use pretty_assertions::assert_eq;
use serde_json::json;
use warden_validator::prelude::*;

async fn username_taken(name: Value) -> bool {
    tokio::task::yield_now().await;
    name.as_str() != Some("admin")
}

async fn unavailable(_: Value) -> bool {
    panic!("db down")
}

#[tokio::test]
async fn async_refinement_reports_at_field_path() {
    let schema = object! {
        username: string().min(3).refine_async(username_taken, "Username is taken"),
    };

    let ok = schema.validate_async(&Value::from(json!({"username": "ada"}))).await;
    assert_eq!(ok, Ok(Value::from(json!({"username": "ada"}))));

    let errors = schema
        .validate_async(&Value::from(json!({"username": "admin"})))
        .await
        .unwrap_err();
    assert_eq!(errors.first().path, "username");
    assert_eq!(errors.first().code, ErrorCode::RefinementFailed);
    assert_eq!(errors.first().message, "Username is taken");
}

#[tokio::test]
async fn sync_checks_run_before_async_steps() {
    let schema = string().min(3).refine_async(unavailable, "unreachable");
    let errors = schema.validate_async(&Value::from("ab")).await.unwrap_err();
    assert_eq!(errors.codes(), vec![ErrorCode::StringTooShort]);
}

#[tokio::test]
async fn sync_validation_skips_async_steps() {
    let schema = string().refine_async(|_| async { false }, "never passes");
    assert!(schema.validate(&Value::from("x")).is_ok());
    assert!(schema.validate_async(&Value::from("x")).await.is_err());
}

#[tokio::test]
async fn async_transform_feeds_the_output() {
    let schema = array(
        string().transform_async(|v| async move {
            Value::from(v.as_str().map(str::to_uppercase).unwrap_or_default())
        }),
    );
    let output = schema.validate_async(&Value::from(json!(["a", "b"]))).await;
    assert_eq!(output, Ok(Value::from(json!(["A", "B"]))));
}

#[tokio::test]
async fn failing_async_transform_is_reported() {
    let schema = string().try_transform_async(|_| async { Err::<Value, _>("lookup failed") });
    let errors = schema.validate_async(&Value::from("x")).await.unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::TransformFailed);
    assert_eq!(errors.first().message, "lookup failed");
}

#[tokio::test]
async fn panicking_refinement_becomes_an_error() {
    let schema = number().refine_async(unavailable, "unused");
    let errors = schema.validate_async(&Value::from(1)).await.unwrap_err();
    assert_eq!(errors.first().code, ErrorCode::RefinementFailed);
    assert!(errors.first().message.contains("db down"));
}

#[tokio::test]
async fn discriminated_union_runs_async_option() {
    let schema = discriminated_union(
        "kind",
        [
            object! {
                kind: literal("user"),
                name: string().refine_async(username_taken, "taken"),
            },
            object! { kind: literal("bot") },
        ],
    )
    .unwrap();

    let input = Value::from(json!({"kind": "user", "name": "admin"}));
    let errors = schema.validate_async(&input).await.unwrap_err();
    assert_eq!(errors.first().path, "name");
    assert!(schema.validate(&input).is_ok());
}

#[tokio::test]
async fn compiled_validator_runs_async_steps() {
    let schema = object! {
        name: string().refine_async(username_taken, "taken"),
    };
    let compiled = compile(schema);
    let input = Value::from(json!({"name": "admin"}));

    assert!(compiled.validate(&input).is_ok());
    assert!(compiled.validate_async(&input).await.is_err());
}
