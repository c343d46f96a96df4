//! Array and tuple schemas
//!
//! Both check the container first (type, depth guard, length constraints)
//! and stop there on failure; only a well-formed container has its
//! elements validated. Element errors are all collected, each under its
//! index.

use std::collections::HashSet;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::foundation::{
    ErrorCode, Validate, ValidationContext, ValidationError, ValidationResult, finish,
};
use crate::schema::Schema;
use crate::security::{SecurityLimits, object_guard};
use crate::value::Value;

/// Type check and depth guard shared by every array-shaped node.
fn items<'v>(
    value: &'v Value,
    ctx: &ValidationContext,
    limits: &SecurityLimits,
) -> Result<&'v [Value], ValidationError> {
    let Value::Array(items) = value else {
        return Err(ctx.type_mismatch(ErrorCode::NotArray, "array", value));
    };
    object_guard::check_depth(ctx.depth(), limits).map_err(|e| ctx.violation(&e))?;
    Ok(items)
}

/// Boolean form of [`items`]: no error is built and nothing is logged.
fn items_ok<'v>(value: &'v Value, depth: usize, limits: &SecurityLimits) -> Option<&'v [Value]> {
    match value {
        Value::Array(items) if object_guard::check_depth(depth, limits).is_ok() => Some(items),
        _ => None,
    }
}

/// A violated container constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Min(usize),
    Max(usize),
    Length(usize),
    Empty,
    Duplicate(usize),
}

impl Bound {
    fn error(self, noun: &str, ctx: &ValidationContext) -> ValidationError {
        match self {
            Self::Min(n) => ctx
                .error(
                    ErrorCode::ArrayTooShort,
                    format!("{noun} must contain at least {n} element(s)"),
                )
                .with_meta("minimum", n),
            Self::Max(n) => ctx
                .error(
                    ErrorCode::ArrayTooLong,
                    format!("{noun} must contain at most {n} element(s)"),
                )
                .with_meta("maximum", n),
            Self::Length(n) => ctx
                .error(
                    ErrorCode::ArrayInvalidLength,
                    format!("{noun} must contain exactly {n} element(s)"),
                )
                .with_meta("length", n),
            Self::Empty => ctx.error(ErrorCode::ArrayTooShort, format!("{noun} must not be empty")),
            Self::Duplicate(index) => ctx
                .error(ErrorCode::ArrayNotUnique, format!("{noun} elements must be unique"))
                .with_meta("index", index),
        }
    }
}

fn collect(result: ValidationResult, out: &mut Vec<Value>, errors: &mut Vec<ValidationError>) {
    match result {
        Ok(value) => out.push(value),
        Err(e) => errors.extend(e),
    }
}

// ============================================================================
// ARRAY
// ============================================================================

/// Accepts arrays whose elements all match one schema.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    element: Schema,
    min: Option<usize>,
    max: Option<usize>,
    length: Option<usize>,
    nonempty: bool,
    unique: bool,
    limits: SecurityLimits,
}

/// An array of `element`.
pub fn array(element: impl Into<Schema>) -> ArraySchema {
    ArraySchema {
        element: element.into(),
        min: None,
        max: None,
        length: None,
        nonempty: false,
        unique: false,
        limits: SecurityLimits::default(),
    }
}

impl ArraySchema {
    #[must_use]
    pub const fn element(&self) -> &Schema {
        &self.element
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn min(mut self, n: usize) -> Self {
        self.min = Some(n);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn max(mut self, n: usize) -> Self {
        self.max = Some(n);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn length(mut self, n: usize) -> Self {
        self.length = Some(n);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn nonempty(mut self) -> Self {
        self.nonempty = true;
        self
    }

    /// Rejects arrays holding two SameValueZero-equal elements. Composite
    /// elements compare by identity.
    #[must_use = "builder methods must be chained or built"]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    /// First violated container constraint.
    fn bound(&self, items: &[Value]) -> Option<Bound> {
        let len = items.len();
        if let Some(n) = self.min.filter(|n| len < *n) {
            return Some(Bound::Min(n));
        }
        if let Some(n) = self.max.filter(|n| len > *n) {
            return Some(Bound::Max(n));
        }
        if let Some(n) = self.length.filter(|n| len != *n) {
            return Some(Bound::Length(n));
        }
        if self.nonempty && len == 0 {
            return Some(Bound::Empty);
        }
        if self.unique {
            let mut seen = HashSet::with_capacity(len);
            if let Some(index) = items.iter().position(|v| !seen.insert(v.key())) {
                return Some(Bound::Duplicate(index));
            }
        }
        None
    }

    pub(crate) fn run<F>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        element: F,
    ) -> ValidationResult
    where
        F: Fn(&Value, &ValidationContext) -> ValidationResult,
    {
        let items = items(value, ctx, &self.limits)?;
        if let Some(bound) = self.bound(items) {
            return Err(bound.error("Array", ctx).into());
        }
        let mut out = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (i, item) in items.iter().enumerate() {
            collect(element(item, &ctx.child_index(i)), &mut out, &mut errors);
        }
        finish(errors, Value::from(out))
    }

    pub(crate) fn check<F>(&self, value: &Value, depth: usize, element_is: F) -> bool
    where
        F: Fn(&Value, usize) -> bool,
    {
        items_ok(value, depth, &self.limits).is_some_and(|items| {
            self.bound(items).is_none() && items.iter().all(|item| element_is(item, depth + 1))
        })
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let items = items(value, &ctx, &self.limits)?;
        if let Some(bound) = self.bound(items) {
            return Err(bound.error("Array", &ctx).into());
        }
        let mut out = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let result = self.element.validate_async_in(item, ctx.child_index(i)).await;
            collect(result, &mut out, &mut errors);
        }
        finish(errors, Value::from(out))
    }
}

impl Validate for ArraySchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(value, ctx, |v, c| self.element.validate_in(v, c))
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(value, depth, |v, d| self.element.is_in(v, d))
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        self.run_async(value, ctx).boxed()
    }
}

// ============================================================================
// TUPLE
// ============================================================================

/// Accepts arrays with positional element schemas and an optional rest
/// schema for trailing elements.
#[derive(Debug, Clone)]
pub struct TupleSchema {
    items: Arc<[Schema]>,
    rest: Option<Schema>,
    limits: SecurityLimits,
}

/// A tuple of the given positional schemas.
pub fn tuple<S, I>(items: I) -> TupleSchema
where
    S: Into<Schema>,
    I: IntoIterator<Item = S>,
{
    TupleSchema {
        items: items.into_iter().map(Into::into).collect(),
        rest: None,
        limits: SecurityLimits::default(),
    }
}

impl TupleSchema {
    #[must_use]
    pub fn items(&self) -> &[Schema] {
        &self.items
    }

    #[must_use]
    pub const fn rest_schema(&self) -> Option<&Schema> {
        self.rest.as_ref()
    }

    /// Schema for elements past the positional ones.
    #[must_use = "builder methods must be chained or built"]
    pub fn rest(mut self, schema: impl Into<Schema>) -> Self {
        self.rest = Some(schema.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Schema for the element at `index`.
    pub(crate) fn schema_at(&self, index: usize) -> Option<&Schema> {
        self.items.get(index).or(self.rest.as_ref())
    }

    fn bound(&self, len: usize) -> Option<Bound> {
        let n = self.items.len();
        if len < n {
            return Some(Bound::Min(n));
        }
        if len > n && self.rest.is_none() {
            return Some(Bound::Max(n));
        }
        None
    }

    /// `item(i, v, ctx)` validates the element at index `i` (positional
    /// schema, or rest past the end).
    pub(crate) fn run<F>(&self, value: &Value, ctx: &ValidationContext, item: F) -> ValidationResult
    where
        F: Fn(usize, &Value, &ValidationContext) -> ValidationResult,
    {
        let items = items(value, ctx, &self.limits)?;
        if let Some(bound) = self.bound(items.len()) {
            return Err(bound.error("Tuple", ctx).into());
        }
        let mut out = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (i, element) in items.iter().enumerate() {
            collect(item(i, element, &ctx.child_index(i)), &mut out, &mut errors);
        }
        finish(errors, Value::from(out))
    }

    pub(crate) fn check<F>(&self, value: &Value, depth: usize, item_is: F) -> bool
    where
        F: Fn(usize, &Value, usize) -> bool,
    {
        items_ok(value, depth, &self.limits).is_some_and(|items| {
            self.bound(items.len()).is_none()
                && items
                    .iter()
                    .enumerate()
                    .all(|(i, element)| item_is(i, element, depth + 1))
        })
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let items = items(value, &ctx, &self.limits)?;
        if let Some(bound) = self.bound(items.len()) {
            return Err(bound.error("Tuple", &ctx).into());
        }
        let mut out = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (i, element) in items.iter().enumerate() {
            // bound() guarantees a schema for every index
            let Some(schema) = self.schema_at(i) else {
                continue;
            };
            let result = schema.validate_async_in(element, ctx.child_index(i)).await;
            collect(result, &mut out, &mut errors);
        }
        finish(errors, Value::from(out))
    }
}

impl Validate for TupleSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(value, ctx, |i, v, c| match self.schema_at(i) {
            Some(schema) => schema.validate_in(v, c),
            None => Ok(v.clone()),
        })
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(value, depth, |i, v, d| {
            self.schema_at(i).is_some_and(|schema| schema.is_in(v, d))
        })
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        self.run_async(value, ctx).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{number, string};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_element_errors_carry_index() {
        let err = array(number()).validate(&v(json!([1, "x", 3, null]))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::NotNumber, ErrorCode::NotNumber]);
        assert_eq!(err.as_slice()[0].path, "1");
        assert_eq!(err.as_slice()[1].path, "3");
    }

    #[rstest]
    #[case(array(number()).min(2), json!([1]), ErrorCode::ArrayTooShort)]
    #[case(array(number()).max(1), json!([1, 2]), ErrorCode::ArrayTooLong)]
    #[case(array(number()).length(2), json!([1, 2, 3]), ErrorCode::ArrayInvalidLength)]
    #[case(array(number()).nonempty(), json!([]), ErrorCode::ArrayTooShort)]
    #[case(array(number()).unique(), json!([1, 2, 1]), ErrorCode::ArrayNotUnique)]
    fn test_container_constraints(
        #[case] schema: ArraySchema,
        #[case] input: serde_json::Value,
        #[case] code: ErrorCode,
    ) {
        let input = v(input);
        let err = schema.validate(&input).unwrap_err();
        assert_eq!(err.codes(), vec![code]);
        assert_eq!(err.first().path, "");
        assert!(!schema.is(&input));
    }

    #[test]
    fn test_constraint_failure_skips_elements() {
        let err = array(string()).min(3).validate(&v(json!([1]))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::ArrayTooShort]);
    }

    #[test]
    fn test_unique_uses_same_value_zero() {
        let schema = array(number()).unique();
        assert!(!schema.is(&Value::from(vec![Value::from(f64::NAN), Value::from(f64::NAN)])));
        assert!(!schema.is(&Value::from(vec![Value::from(0.0), Value::from(-0.0)])));

        let composite = array(crate::validators::any()).unique();
        let shared = v(json!({"a": 1}));
        assert!(composite.is(&Value::from(vec![v(json!({"a": 1})), v(json!({"a": 1}))])));
        assert!(!composite.is(&Value::from(vec![shared.clone(), shared])));
    }

    #[test]
    fn test_tuple_positions_and_rest() {
        let pair = tuple([Schema::from(string()), Schema::from(number())]);
        assert!(pair.is(&v(json!(["a", 1]))));

        let err = pair.validate(&v(json!(["a"]))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::ArrayTooShort]);

        let err = pair.validate(&v(json!(["a", 1, 2]))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::ArrayTooLong]);

        let with_rest = pair.rest(number());
        assert!(with_rest.is(&v(json!(["a", 1, 2, 3]))));
        let err = with_rest.validate(&v(json!(["a", 1, 2, "x"]))).unwrap_err();
        assert_eq!(err.first().path, "3");
    }

    #[test]
    fn test_nesting_is_bounded() {
        let innermost = array(number()).limits(SecurityLimits::default().with_max_depth(1));
        let schema = array(array(innermost));
        let err = schema.validate(&v(json!([[[1]]]))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::SecurityMaxDepth]);
        assert_eq!(err.first().path, "0.0");
        assert!(schema.is(&v(json!([[]]))));
    }

    #[test]
    fn test_is_rejects_without_building_errors() {
        use parking_lot::Mutex;
        use std::io;

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let schema = array(array(number()).limits(SecurityLimits::default().with_max_depth(0)));
        let input = v(json!([[1]]));
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(!schema.is(&input));
            assert!(!tuple([Schema::from(number())]).is(&v(json!([]))));
            assert!(!array(number()).min(2).is(&v(json!([1]))));
        });
        assert!(captured.0.lock().is_empty());

        let err = schema.validate(&input).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::SecurityMaxDepth]);
        assert_eq!(err.first().path, "0");
    }
}
