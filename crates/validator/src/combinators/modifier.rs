//! The modifier node: one wrapper type, one closed set of behaviours.

use std::borrow::Cow;
use std::fmt;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::refine::{self, Refiner};
use super::user_code::{self, AsyncMapper, AsyncPredicate, Mapper, Predicate};
use crate::foundation::{Validate, ValidationContext, ValidationResult};
use crate::schema::Schema;
use crate::value::Value;

/// What a [`ModifiedSchema`] does around its inner schema.
#[derive(Clone)]
pub enum Modifier {
    /// `undefined` passes without reaching the inner schema.
    Optional,
    /// `null` passes without reaching the inner schema.
    Nullable,
    /// `undefined` and `null` pass.
    Nullish,
    /// `undefined` is replaced by the value, which is then validated.
    Default(Value),
    /// Any failure of the inner schema yields the value instead.
    Catch(Value),
    /// Overrides the message of errors reported at this node's own path.
    Message(Cow<'static, str>),
    Refine {
        check: Predicate,
        message: Cow<'static, str>,
    },
    SuperRefine(Refiner),
    Transform(Mapper),
    Preprocess(Mapper),
    /// The inner output is validated by the next schema.
    Pipe(Schema),
    RefineAsync {
        check: AsyncPredicate,
        message: Cow<'static, str>,
    },
    TransformAsync(AsyncMapper),
    PreprocessAsync(AsyncMapper),
}

impl Modifier {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Nullable => "nullable",
            Self::Nullish => "nullish",
            Self::Default(_) => "default",
            Self::Catch(_) => "catch",
            Self::Message(_) => "message",
            Self::Refine { .. } => "refine",
            Self::SuperRefine(_) => "super_refine",
            Self::Transform(_) => "transform",
            Self::Preprocess(_) => "preprocess",
            Self::Pipe(_) => "pipe",
            Self::RefineAsync { .. } => "refine_async",
            Self::TransformAsync(_) => "transform_async",
            Self::PreprocessAsync(_) => "preprocess_async",
        }
    }

    /// `true` when the boolean fast path needs the inner output and must
    /// therefore run the full validation.
    #[must_use]
    pub const fn needs_output(&self) -> bool {
        matches!(
            self,
            Self::Refine { .. }
                | Self::SuperRefine(_)
                | Self::Transform(_)
                | Self::Preprocess(_)
                | Self::Pipe(_)
        )
    }

    /// `true` for steps that only run under async validation.
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(
            self,
            Self::RefineAsync { .. } | Self::TransformAsync(_) | Self::PreprocessAsync(_)
        )
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(v) => f.debug_tuple("Default").field(v).finish(),
            Self::Catch(v) => f.debug_tuple("Catch").field(v).finish(),
            Self::Message(m) => f.debug_tuple("Message").field(m).finish(),
            Self::Pipe(next) => f.debug_tuple("Pipe").field(next).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// A schema wrapped by one [`Modifier`].
#[derive(Debug, Clone)]
pub struct ModifiedSchema {
    inner: Schema,
    modifier: Modifier,
}

impl ModifiedSchema {
    #[must_use]
    pub fn new(inner: impl Into<Schema>, modifier: Modifier) -> Self {
        Self {
            inner: inner.into(),
            modifier,
        }
    }

    #[must_use]
    pub const fn inner(&self) -> &Schema {
        &self.inner
    }

    #[must_use]
    pub const fn modifier(&self) -> &Modifier {
        &self.modifier
    }

    /// Synchronous traversal, parameterized by how the inner and piped
    /// schemas are run. Async steps are skipped.
    pub(crate) fn run<I, N>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        inner: I,
        next: N,
    ) -> ValidationResult
    where
        I: Fn(&Value, &ValidationContext) -> ValidationResult,
        N: Fn(&Value, &ValidationContext) -> ValidationResult,
    {
        match &self.modifier {
            Modifier::Optional if value.is_undefined() => Ok(Value::Undefined),
            Modifier::Nullable if value.is_null() => Ok(Value::Null),
            Modifier::Nullish if value.is_undefined() || value.is_null() => Ok(value.clone()),
            Modifier::Optional | Modifier::Nullable | Modifier::Nullish => inner(value, ctx),
            Modifier::Default(fallback) if value.is_undefined() => inner(fallback, ctx),
            Modifier::Default(_) => inner(value, ctx),
            Modifier::Catch(fallback) => inner(value, ctx).or_else(|_| Ok(fallback.clone())),
            Modifier::Message(message) => inner(value, ctx).map_err(|mut errors| {
                errors.override_message(ctx.path(), message);
                errors
            }),
            Modifier::Refine { check, message } => {
                refine::apply_check(check, message, inner(value, ctx)?, ctx)
            }
            Modifier::SuperRefine(refiner) => {
                refine::apply_refiner(refiner, inner(value, ctx)?, ctx)
            }
            Modifier::Transform(mapper) => {
                user_code::apply_mapper(mapper, &inner(value, ctx)?, ctx)
            }
            Modifier::Preprocess(mapper) => {
                inner(&user_code::apply_mapper(mapper, value, ctx)?, ctx)
            }
            Modifier::Pipe(_) => next(&inner(value, ctx)?, ctx),
            Modifier::RefineAsync { .. }
            | Modifier::TransformAsync(_)
            | Modifier::PreprocessAsync(_) => inner(value, ctx),
        }
    }

    /// Boolean traversal. `full` runs [`run`](Self::run) and is used by the
    /// modifiers whose verdict depends on the inner output.
    pub(crate) fn check<I, F>(&self, value: &Value, depth: usize, inner_is: I, full: F) -> bool
    where
        I: Fn(&Value, usize) -> bool,
        F: FnOnce() -> bool,
    {
        match &self.modifier {
            Modifier::Optional => value.is_undefined() || inner_is(value, depth),
            Modifier::Nullable => value.is_null() || inner_is(value, depth),
            Modifier::Nullish => value.is_undefined() || value.is_null() || inner_is(value, depth),
            Modifier::Default(fallback) if value.is_undefined() => inner_is(fallback, depth),
            Modifier::Catch(_) => true,
            Modifier::Default(_)
            | Modifier::Message(_)
            | Modifier::RefineAsync { .. }
            | Modifier::TransformAsync(_)
            | Modifier::PreprocessAsync(_) => inner_is(value, depth),
            Modifier::Refine { .. }
            | Modifier::SuperRefine(_)
            | Modifier::Transform(_)
            | Modifier::Preprocess(_)
            | Modifier::Pipe(_) => full(),
        }
    }

    fn run_direct(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(
            value,
            ctx,
            |v, c| self.inner.validate_in(v, c),
            |v, c| match &self.modifier {
                Modifier::Pipe(next) => next.validate_in(v, c),
                _ => Ok(v.clone()),
            },
        )
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let inner = &self.inner;
        match &self.modifier {
            Modifier::Optional if value.is_undefined() => Ok(Value::Undefined),
            Modifier::Nullable if value.is_null() => Ok(Value::Null),
            Modifier::Nullish if value.is_undefined() || value.is_null() => Ok(value.clone()),
            Modifier::Optional | Modifier::Nullable | Modifier::Nullish => {
                inner.validate_async_in(value, ctx).await
            }
            Modifier::Default(fallback) if value.is_undefined() => {
                inner.validate_async_in(fallback, ctx).await
            }
            Modifier::Default(_) => inner.validate_async_in(value, ctx).await,
            Modifier::Catch(fallback) => inner
                .validate_async_in(value, ctx)
                .await
                .or_else(|_| Ok(fallback.clone())),
            Modifier::Message(message) => {
                let path = ctx.path().to_owned();
                inner
                    .validate_async_in(value, ctx)
                    .await
                    .map_err(|mut errors| {
                        errors.override_message(&path, message);
                        errors
                    })
            }
            Modifier::Refine { check, message } => {
                let data = inner.validate_async_in(value, ctx.clone()).await?;
                refine::apply_check(check, message, data, &ctx)
            }
            Modifier::SuperRefine(refiner) => {
                let data = inner.validate_async_in(value, ctx.clone()).await?;
                refine::apply_refiner(refiner, data, &ctx)
            }
            Modifier::Transform(mapper) => {
                let data = inner.validate_async_in(value, ctx.clone()).await?;
                user_code::apply_mapper(mapper, &data, &ctx)
            }
            Modifier::Preprocess(mapper) => {
                let input = user_code::apply_mapper(mapper, value, &ctx)?;
                inner.validate_async_in(&input, ctx).await
            }
            Modifier::Pipe(next) => {
                let data = inner.validate_async_in(value, ctx.clone()).await?;
                next.validate_async_in(&data, ctx).await
            }
            Modifier::RefineAsync { check, message } => {
                let data = inner.validate_async_in(value, ctx.clone()).await?;
                refine::apply_async_check(check, message, data, &ctx).await
            }
            Modifier::TransformAsync(mapper) => {
                let data = inner.validate_async_in(value, ctx.clone()).await?;
                user_code::apply_async_mapper(mapper, data, &ctx).await
            }
            Modifier::PreprocessAsync(mapper) => {
                let input = user_code::apply_async_mapper(mapper, value.clone(), &ctx).await?;
                inner.validate_async_in(&input, ctx).await
            }
        }
    }
}

impl Validate for ModifiedSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run_direct(value, ctx)
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(
            value,
            depth,
            |v, d| self.inner.is_in(v, d),
            || {
                self.run_direct(value, &ValidationContext::with_depth(depth))
                    .is_ok()
            },
        )
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        self.run_async(value, ctx).boxed()
    }
}
