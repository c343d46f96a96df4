//! Boundary around caller-supplied closures.
//!
//! Predicates, refiners, transforms and preprocessors are user code. A panic
//! inside one is caught where the node calls it and turned into a
//! validation error, so a buggy refinement fails one value instead of
//! unwinding through the caller.

use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::foundation::{ErrorCode, ValidationContext, ValidationErrors, ValidationResult};
use crate::value::Value;

/// Error type returned by fallible user transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub(crate) type Mapper = Arc<dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync>;
pub(crate) type AsyncPredicate = Arc<dyn Fn(Value) -> BoxFuture<'static, bool> + Send + Sync>;
pub(crate) type AsyncMapper =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// Runs `f`, converting a panic into its message.
pub(crate) fn guard<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

/// Awaits `fut`, converting a panic into its message.
pub(crate) async fn guard_async<F: Future>(fut: F) -> Result<F::Output, String> {
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "user code panicked".to_owned()
    }
}

pub(crate) fn panicked(ctx: &ValidationContext, code: ErrorCode, panic: &str) -> ValidationErrors {
    tracing::debug!(code = code.as_str(), path = %ctx.path(), panic, "user code panicked");
    let what = if code == ErrorCode::TransformFailed {
        "Transform"
    } else {
        "Refinement"
    };
    ctx.error(code, format!("{what} panicked: {panic}")).into()
}

/// Outcome of a mapper call as a validation result.
pub(crate) fn mapped(
    outcome: Result<Result<Value, BoxError>, String>,
    ctx: &ValidationContext,
) -> ValidationResult {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ctx.error(ErrorCode::TransformFailed, err.to_string()).into()),
        Err(panic) => Err(panicked(ctx, ErrorCode::TransformFailed, &panic)),
    }
}

/// Applies a sync mapper to `value`.
pub(crate) fn apply_mapper(
    mapper: &Mapper,
    value: &Value,
    ctx: &ValidationContext,
) -> ValidationResult {
    mapped(guard(|| mapper(value)), ctx)
}

/// Applies an async mapper to `value`.
pub(crate) async fn apply_async_mapper(
    mapper: &AsyncMapper,
    value: Value,
    ctx: &ValidationContext,
) -> ValidationResult {
    let outcome = match guard(|| mapper(value)) {
        Ok(fut) => guard_async(fut).await,
        Err(panic) => Err(panic),
    };
    mapped(outcome, ctx)
}
