//! Intersection schema
//!
//! Every branch validates the same input and every branch error is
//! reported. When all branches pass, their outputs are merged: objects key
//! by key, arrays of equal length element by element, anything else only
//! when the outputs are equal.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::foundation::{ErrorCode, Validate, ValidationContext, ValidationResult, finish};
use crate::schema::Schema;
use crate::value::{Object, Value};

/// Accepts values matching every branch.
#[derive(Debug, Clone)]
pub struct IntersectionSchema {
    branches: Arc<[Schema]>,
}

/// An intersection of `branches`.
pub fn intersection<S, I>(branches: I) -> IntersectionSchema
where
    S: Into<Schema>,
    I: IntoIterator<Item = S>,
{
    IntersectionSchema::new(branches)
}

/// Merges two branch outputs; `None` when they cannot be reconciled.
fn merge_values(a: &Value, b: &Value) -> Option<Value> {
    if a == b || a.same_value_zero(b) {
        return Some(a.clone());
    }
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            let mut merged: Object = (**left).clone();
            for (key, value) in right.iter() {
                let entry = match left.get(key) {
                    Some(existing) => merge_values(existing, value)?,
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Some(Value::from(merged))
        }
        (Value::Array(left), Value::Array(right)) if left.len() == right.len() => left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| merge_values(l, r))
            .collect::<Option<Vec<_>>>()
            .map(Value::from),
        _ => None,
    }
}

impl IntersectionSchema {
    pub fn new<S, I>(branches: I) -> Self
    where
        S: Into<Schema>,
        I: IntoIterator<Item = S>,
    {
        Self {
            branches: branches.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn branches(&self) -> &[Schema] {
        &self.branches
    }

    fn merge(outputs: Vec<Value>, ctx: &ValidationContext) -> ValidationResult {
        let mut outputs = outputs.into_iter();
        let Some(first) = outputs.next() else {
            return Ok(Value::Undefined);
        };
        outputs.try_fold(first, |acc, next| {
            merge_values(&acc, &next).ok_or_else(|| {
                ctx.error(
                    ErrorCode::IntersectionConflict,
                    "Intersection results could not be merged",
                )
                .into()
            })
        })
    }

    fn combine(results: Vec<ValidationResult>, ctx: &ValidationContext) -> ValidationResult {
        let mut outputs = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(value) => outputs.push(value),
                Err(e) => errors.extend(e),
            }
        }
        if !errors.is_empty() {
            return finish(errors, Value::Undefined);
        }
        Self::merge(outputs, ctx)
    }

    pub(crate) fn run<F>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        branch: F,
    ) -> ValidationResult
    where
        F: Fn(usize, &Value, &ValidationContext) -> ValidationResult,
    {
        let results = (0..self.branches.len())
            .map(|i| branch(i, value, ctx))
            .collect();
        Self::combine(results, ctx)
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let mut results = Vec::with_capacity(self.branches.len());
        for branch in self.branches.iter() {
            results.push(branch.validate_async_in(value, ctx.clone()).await);
        }
        Self::combine(results, &ctx)
    }
}

impl Validate for IntersectionSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(value, ctx, |i, v, c| self.branches[i].validate_in(v, c))
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
    use crate::combinators::SchemaExt;
    use crate::validators::{number, object, string};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_merges_object_outputs() {
        let named = object([("name", string())]);
        let aged = object([("age", number())]);
        let both = intersection([Schema::from(named), Schema::from(aged)]);
        let out = both
            .validate(&Value::from(json!({"name": "a", "age": 1, "x": true})))
            .unwrap();
        assert_eq!(out, Value::from(json!({"name": "a", "age": 1})));
    }

    #[test]
    fn test_reports_every_branch_error() {
        let both = object([("name", string())]).and(object([("age", number())]));
        let err = both.validate(&Value::from(json!({}))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::NotString, ErrorCode::NotNumber]);
        assert!(!both.is(&Value::from(json!({}))));
    }

    #[test]
    fn test_conflicting_outputs() {
        let both = intersection([
            string().transform(|_| Value::from("left")),
            string().transform(|_| Value::from("right")),
        ]);
        let err = both.validate(&Value::from("x")).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::IntersectionConflict]);
        assert!(!both.is(&Value::from("x")));
    }

    #[test]
    fn test_merge_rules() {
        let a = Value::from(json!({"x": [1, {"y": 1}]}));
        let b = Value::from(json!({"x": [1, {"z": 2}]}));
        assert_eq!(
            merge_values(&a, &b),
            Some(Value::from(json!({"x": [1, {"y": 1, "z": 2}]})))
        );
        assert_eq!(merge_values(&Value::from(json!([1])), &Value::from(json!([1, 2]))), None);
        assert_eq!(
            merge_values(&Value::from(f64::NAN), &Value::from(f64::NAN)).map(|v| v.type_name()),
            Some("nan")
        );
    }
}
