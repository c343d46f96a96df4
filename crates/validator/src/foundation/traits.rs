//! Core traits for the validation system
//!
//! Every schema node, typed builder and compiled validator implements
//! [`Validate`]. Implementors provide the context-aware `validate_in` (and,
//! when they can answer without building errors, `is_in`); the caller-facing
//! entry points are provided methods.

use futures::FutureExt;
use futures::future::BoxFuture;

use super::context::ValidationContext;
use super::error::ValidationResult;
use crate::value::Value;

// ============================================================================
// CORE VALIDATOR TRAIT
// ============================================================================

/// The contract shared by every validator.
///
/// ```rust,ignore
/// use warden_validator::prelude::*;
///
/// let schema = string().min(3);
/// assert!(schema.is(&Value::from("alice")));
///
/// let errors = schema.validate(&Value::from("al")).unwrap_err();
/// assert_eq!(errors.first().code, ErrorCode::StringTooShort);
/// ```
pub trait Validate: Send + Sync {
    /// Validates `value` located at `ctx`.
    ///
    /// Returns the output value (possibly transformed) or every error found,
    /// with paths rooted at `ctx.path()`.
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult;

    /// Boolean fast path; must agree with `validate_in(..).is_ok()`.
    ///
    /// `depth` is the container depth of `value`, as in
    /// [`ValidationContext::depth`]. The default runs the full path.
    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.validate_in(value, &ValidationContext::with_depth(depth))
            .is_ok()
    }

    /// Async validation at `ctx`. Only nodes with async steps override this.
    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        futures::future::ready(self.validate_in(value, &ctx)).boxed()
    }

    /// Validates `value` at the root.
    fn validate(&self, value: &Value) -> ValidationResult {
        self.validate_in(value, &ValidationContext::root())
    }

    /// Validates `value`, reporting errors under `path`.
    fn validate_at(&self, value: &Value, path: &str) -> ValidationResult {
        self.validate_in(value, &ValidationContext::at(path))
    }

    /// `true` if `value` is valid. Builds no error values where the node
    /// supports it.
    fn is(&self, value: &Value) -> bool {
        self.is_in(value, 0)
    }

    /// Returns the validated output; the `?`-friendly entry point.
    ///
    /// # Errors
    ///
    /// Every validation failure found.
    fn parse(&self, value: &Value) -> Result<Value, super::ValidationErrors> {
        self.validate(value)
    }

    /// Succeeds only if `value` is valid, discarding the output.
    ///
    /// # Errors
    ///
    /// Every validation failure found.
    fn assert(&self, value: &Value) -> Result<(), super::ValidationErrors> {
        self.validate(value).map(|_| ())
    }

    /// Validates `value`, running async refinements and transforms.
    fn validate_async<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, ValidationResult> {
        self.validate_async_in(value, ValidationContext::root())
    }
}

impl<V: Validate + ?Sized> Validate for std::sync::Arc<V> {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        (**self).validate_in(value, ctx)
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        (**self).is_in(value, depth)
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        (**self).validate_async_in(value, ctx)
    }
}

impl<V: Validate + ?Sized> Validate for Box<V> {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        (**self).validate_in(value, ctx)
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        (**self).is_in(value, depth)
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        (**self).validate_async_in(value, ctx)
    }
}
