//! Refinements: predicates and multi-issue refiners run on a node's output.

use std::borrow::Cow;
use std::sync::Arc;

use super::user_code::{self, AsyncPredicate, Predicate};
use crate::foundation::{
    ErrorCode, ValidationContext, ValidationError, ValidationErrors, ValidationResult,
};
use crate::value::Value;

pub(crate) type Refiner = Arc<dyn Fn(&Value, &mut RefinementContext) -> bool + Send + Sync>;

/// Handed to `super_refine` refiners to report issues.
///
/// ```rust,ignore
/// let signup = object! {
///     password: string(),
///     confirm: string(),
/// }
/// .super_refine(|value, ctx| {
///     if value.get("password") != value.get("confirm") {
///         ctx.add_issue_at("confirm", "Passwords do not match");
///     }
///     true
/// });
/// ```
#[derive(Debug)]
pub struct RefinementContext {
    ctx: ValidationContext,
    issues: Vec<ValidationError>,
}

impl RefinementContext {
    pub(crate) const fn new(ctx: ValidationContext) -> Self {
        Self {
            ctx,
            issues: Vec::new(),
        }
    }

    /// Path of the value being refined.
    #[must_use]
    pub fn path(&self) -> &str {
        self.ctx.path()
    }

    /// Reports a `CUSTOM` issue at the refined value's path.
    pub fn add_issue(&mut self, message: impl Into<Cow<'static, str>>) {
        self.issues.push(self.ctx.error(ErrorCode::Custom, message));
    }

    /// Reports a `CUSTOM` issue at `sub_path` below the refined value
    /// (dot-joined, e.g. `"address.zip"`).
    pub fn add_issue_at(&mut self, sub_path: &str, message: impl Into<Cow<'static, str>>) {
        self.issues
            .push(self.ctx.at_key(sub_path).error(ErrorCode::Custom, message));
    }

    /// Reports a fully built error; its path is taken relative to the
    /// refined value.
    pub fn add_error(&mut self, mut error: ValidationError) {
        error.path = if error.path.is_empty() {
            self.ctx.path().to_owned()
        } else {
            self.ctx.at_key(&error.path).path().to_owned()
        };
        self.issues.push(error);
    }

    /// Number of issues reported so far.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

fn refinement_failed(ctx: &ValidationContext, message: &Cow<'static, str>) -> ValidationErrors {
    ctx.error(ErrorCode::RefinementFailed, message.clone()).into()
}

/// Runs a predicate on `data`.
pub(crate) fn apply_check(
    check: &Predicate,
    message: &Cow<'static, str>,
    data: Value,
    ctx: &ValidationContext,
) -> ValidationResult {
    match user_code::guard(|| check(&data)) {
        Ok(true) => Ok(data),
        Ok(false) => Err(refinement_failed(ctx, message)),
        Err(panic) => Err(user_code::panicked(ctx, ErrorCode::RefinementFailed, &panic)),
    }
}

/// Runs an async predicate on `data`.
pub(crate) async fn apply_async_check(
    check: &AsyncPredicate,
    message: &Cow<'static, str>,
    data: Value,
    ctx: &ValidationContext,
) -> ValidationResult {
    let outcome = match user_code::guard(|| check(data.clone())) {
        Ok(fut) => user_code::guard_async(fut).await,
        Err(panic) => Err(panic),
    };
    match outcome {
        Ok(true) => Ok(data),
        Ok(false) => Err(refinement_failed(ctx, message)),
        Err(panic) => Err(user_code::panicked(ctx, ErrorCode::RefinementFailed, &panic)),
    }
}

/// Runs a refiner on `data`. Reported issues win over the return value; a
/// bare `false` becomes a generic `REFINEMENT_FAILED`.
pub(crate) fn apply_refiner(
    refiner: &Refiner,
    data: Value,
    ctx: &ValidationContext,
) -> ValidationResult {
    let mut rc = RefinementContext::new(ctx.clone());
    let outcome = user_code::guard(|| refiner(&data, &mut rc));
    if let Some(errors) = ValidationErrors::from_vec(rc.issues) {
        return Err(errors);
    }
    match outcome {
        Ok(true) => Ok(data),
        Ok(false) => Err(refinement_failed(ctx, &Cow::Borrowed("Refinement failed"))),
        Err(panic) => Err(user_code::panicked(ctx, ErrorCode::RefinementFailed, &panic)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refiner(
        f: impl Fn(&Value, &mut RefinementContext) -> bool + Send + Sync + 'static,
    ) -> Refiner {
        Arc::new(f)
    }

    #[test]
    fn test_issues_are_custom_and_pathed() {
        let r = refiner(|_, ctx| {
            ctx.add_issue("top");
            ctx.add_issue_at("confirm", "mismatch");
            true
        });
        let ctx = ValidationContext::root().child_key("form");
        let err = apply_refiner(&r, Value::Null, &ctx).unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.as_slice()[0].path, "form");
        assert_eq!(err.as_slice()[1].path, "form.confirm");
        assert!(err.iter().all(|e| e.code == ErrorCode::Custom));
    }

    #[test]
    fn test_bare_false_is_generic_failure() {
        let r = refiner(|_, _| false);
        let err = apply_refiner(&r, Value::Null, &ValidationContext::root()).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::RefinementFailed]);
    }

    #[test]
    fn test_add_error_is_relative() {
        let r = refiner(|_, ctx| {
            ctx.add_error(ValidationError::new(ErrorCode::Custom, "x").with_path("a.b"));
            false
        });
        let ctx = ValidationContext::root().child_key("root");
        let err = apply_refiner(&r, Value::Null, &ctx).unwrap_err();
        assert_eq!(err.first().path, "root.a.b");
    }

    #[test]
    fn test_predicate_panic_becomes_refinement_failed() {
        let check: Predicate = Arc::new(|_: &Value| -> bool { panic!("nope") });
        let err = apply_check(
            &check,
            &Cow::Borrowed("unused"),
            Value::Null,
            &ValidationContext::root(),
        )
        .unwrap_err();
        assert_eq!(err.first().code, ErrorCode::RefinementFailed);
        assert_eq!(err.first().message, "Refinement panicked: nope");
    }
}
