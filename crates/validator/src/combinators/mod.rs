//! Schema modifiers and composition helpers
//!
//! [`SchemaExt`] is implemented for everything that converts into a
//! [`Schema`], so every builder gets the same chainable modifiers:
//!
//! ```rust,ignore
//! use warden_validator::prelude::*;
//!
//! let age = number().int().min(0.0).optional();
//! let slug = string()
//!     .trim()
//!     .to_lowercase()
//!     .refine(|v| !v.as_str().unwrap_or("").contains(' '), "No spaces");
//! ```
//!
//! Each call wraps the receiver in a [`ModifiedSchema`]; the receiver itself
//! is never changed.

mod lazy;
mod modifier;
mod refine;
mod user_code;

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

pub use lazy::{LazySchema, lazy};
pub use modifier::{ModifiedSchema, Modifier};
pub use refine::RefinementContext;
pub use user_code::BoxError;

use crate::schema::Schema;
use crate::validators::{IntersectionSchema, UnionSchema};
use crate::value::Value;

/// Chainable modifiers available on every schema.
pub trait SchemaExt: Into<Schema> + Sized {
    /// Wraps `self` in `modifier`.
    #[must_use]
    fn modify(self, modifier: Modifier) -> Schema {
        ModifiedSchema::new(self, modifier).into()
    }

    /// Also accepts `undefined`.
    #[must_use]
    fn optional(self) -> Schema {
        self.modify(Modifier::Optional)
    }

    /// Also accepts `null`.
    #[must_use]
    fn nullable(self) -> Schema {
        self.modify(Modifier::Nullable)
    }

    /// Also accepts `undefined` and `null`.
    #[must_use]
    fn nullish(self) -> Schema {
        self.modify(Modifier::Nullish)
    }

    /// Substitutes `value` for `undefined` before validating.
    #[must_use]
    fn default(self, value: impl Into<Value>) -> Schema {
        self.modify(Modifier::Default(value.into()))
    }

    /// Yields `value` whenever validation fails.
    #[must_use]
    fn catch(self, value: impl Into<Value>) -> Schema {
        self.modify(Modifier::Catch(value.into()))
    }

    /// Replaces the message of errors reported at this node's own path.
    #[must_use]
    fn with_message(self, message: impl Into<Cow<'static, str>>) -> Schema {
        self.modify(Modifier::Message(message.into()))
    }

    /// Fails with `REFINEMENT_FAILED` and `message` when `check` returns
    /// `false` for the validated output.
    #[must_use]
    fn refine<F>(self, check: F, message: impl Into<Cow<'static, str>>) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.modify(Modifier::Refine {
            check: Arc::new(check),
            message: message.into(),
        })
    }

    /// Runs `refiner` on the validated output; it may report any number of
    /// issues through the [`RefinementContext`].
    #[must_use]
    fn super_refine<F>(self, refiner: F) -> Schema
    where
        F: Fn(&Value, &mut RefinementContext) -> bool + Send + Sync + 'static,
    {
        self.modify(Modifier::SuperRefine(Arc::new(refiner)))
    }

    /// Maps the validated output.
    #[must_use]
    fn transform<F>(self, f: F) -> Schema
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.modify(Modifier::Transform(Arc::new(move |v: &Value| -> Result<Value, BoxError> {
            Ok(f(v))
        })))
    }

    /// Maps the validated output; an `Err` becomes `TRANSFORM_FAILED`.
    #[must_use]
    fn try_transform<F, E>(self, f: F) -> Schema
    where
        F: Fn(&Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.modify(Modifier::Transform(Arc::new(move |v: &Value| -> Result<Value, BoxError> {
            f(v).map_err(Into::into)
        })))
    }

    /// Maps the raw input before validation.
    #[must_use]
    fn preprocess<F>(self, f: F) -> Schema
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.modify(Modifier::Preprocess(Arc::new(move |v: &Value| -> Result<Value, BoxError> {
            Ok(f(v))
        })))
    }

    /// Maps the raw input before validation; an `Err` becomes
    /// `TRANSFORM_FAILED`.
    #[must_use]
    fn try_preprocess<F, E>(self, f: F) -> Schema
    where
        F: Fn(&Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.modify(Modifier::Preprocess(Arc::new(move |v: &Value| -> Result<Value, BoxError> {
            f(v).map_err(Into::into)
        })))
    }

    /// Validates the output of `self` with `next`.
    #[must_use]
    fn pipe(self, next: impl Into<Schema>) -> Schema {
        self.modify(Modifier::Pipe(next.into()))
    }

    /// Async predicate; only evaluated by `validate_async`.
    #[must_use]
    fn refine_async<F, Fut>(self, check: F, message: impl Into<Cow<'static, str>>) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.modify(Modifier::RefineAsync {
            check: Arc::new(move |v: Value| check(v).boxed()),
            message: message.into(),
        })
    }

    /// Async output mapping; only applied by `validate_async`.
    #[must_use]
    fn transform_async<F, Fut>(self, f: F) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.modify(Modifier::TransformAsync(Arc::new(move |v: Value| {
            f(v).map(Ok::<Value, BoxError>).boxed()
        })))
    }

    /// Fallible async output mapping; only applied by `validate_async`.
    #[must_use]
    fn try_transform_async<F, Fut, E>(self, f: F) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.modify(Modifier::TransformAsync(Arc::new(move |v: Value| {
            f(v).map(|r| r.map_err(Into::<BoxError>::into)).boxed()
        })))
    }

    /// Async input mapping; only applied by `validate_async`. The sync path
    /// hands the raw input to the inner schema.
    #[must_use]
    fn preprocess_async<F, Fut>(self, f: F) -> Schema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.modify(Modifier::PreprocessAsync(Arc::new(move |v: Value| {
            f(v).map(Ok::<Value, BoxError>).boxed()
        })))
    }

    /// Union of `self` and `other`.
    #[must_use]
    fn or(self, other: impl Into<Schema>) -> Schema {
        UnionSchema::new([self.into(), other.into()]).into()
    }

    /// Intersection of `self` and `other`.
    #[must_use]
    fn and(self, other: impl Into<Schema>) -> Schema {
        IntersectionSchema::new([self.into(), other.into()]).into()
    }
}

impl<T: Into<Schema>> SchemaExt for T {}
