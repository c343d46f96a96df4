//! LAZY schema - deferred construction for recursive schemas

use std::fmt;
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;

use crate::foundation::{Validate, ValidationContext, ValidationResult};
use crate::schema::Schema;
use crate::value::Value;

struct LazyCell {
    init: Box<dyn Fn() -> Schema + Send + Sync>,
    schema: OnceLock<Schema>,
}

/// Defers schema construction until first use.
///
/// The thunk runs at most once; every later use (including from clones of
/// this handle) gets the memoized schema. This is the only way to build a
/// cyclic schema:
///
/// ```rust,ignore
/// use warden_validator::prelude::*;
///
/// fn category() -> Schema {
///     object! {
///         name: string(),
///         children: array(lazy(category)),
///     }
///     .into()
/// }
/// ```
///
/// Recursion over data is bounded by the depth guard, not by the schema.
#[derive(Clone)]
pub struct LazySchema {
    cell: Arc<LazyCell>,
}

/// A schema built by `init` on first use.
pub fn lazy<F, S>(init: F) -> LazySchema
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Into<Schema>,
{
    LazySchema {
        cell: Arc::new(LazyCell {
            init: Box::new(move || init().into()),
            schema: OnceLock::new(),
        }),
    }
}

impl LazySchema {
    /// The resolved schema, running the thunk on first call.
    pub fn resolve(&self) -> &Schema {
        self.cell.schema.get_or_init(&self.cell.init)
    }

    /// Returns true if the thunk has run.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cell.schema.get().is_some()
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySchema")
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

impl Validate for LazySchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.resolve().validate_in(value, ctx)
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.resolve().is_in(value, depth)
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        self.resolve().validate_async_in(value, ctx)
    }
}
