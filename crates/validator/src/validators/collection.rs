//! Record, map and set schemas

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::foundation::{
    ErrorCode, Validate, ValidationContext, ValidationError, ValidationResult, finish,
};
use crate::schema::Schema;
use crate::security::{SecurityLimits, object_guard};
use crate::value::{Object, Value};

/// Output key for a record entry: the key schema's output when it is a
/// string, the input key otherwise.
pub(crate) fn record_key(input: &str, output: &Value) -> String {
    output.as_str().unwrap_or(input).to_owned()
}

// ============================================================================
// RECORD
// ============================================================================

/// Accepts objects with arbitrary keys whose values share one schema.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    key: Option<Schema>,
    value: Schema,
    limits: SecurityLimits,
}

/// A record whose values match `value`.
pub fn record(value: impl Into<Schema>) -> RecordSchema {
    RecordSchema {
        key: None,
        value: value.into(),
        limits: SecurityLimits::default(),
    }
}

impl RecordSchema {
    /// Validates every key (as a string value) against `key`.
    #[must_use = "builder methods must be chained or built"]
    pub fn keys(mut self, key: impl Into<Schema>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn key_schema(&self) -> Option<&Schema> {
        self.key.as_ref()
    }

    #[must_use]
    pub const fn value_schema(&self) -> &Schema {
        &self.value
    }

    fn input<'v>(
        &self,
        value: &'v Value,
        ctx: &ValidationContext,
    ) -> Result<&'v Object, ValidationError> {
        let Value::Object(input) = value else {
            return Err(ctx.type_mismatch(ErrorCode::NotObject, "object", value));
        };
        object_guard::check_object(input, ctx.depth(), &self.limits)
            .map_err(|e| ctx.violation(&e))?;
        Ok(input)
    }

    /// Without a key schema, `key` is never called.
    pub(crate) fn run<K, V>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        key: K,
        val: V,
    ) -> ValidationResult
    where
        K: Fn(&Value, &ValidationContext) -> ValidationResult,
        V: Fn(&Value, &ValidationContext) -> ValidationResult,
    {
        let input = self.input(value, ctx)?;
        let mut out = Object::with_capacity(input.len());
        let mut errors = Vec::new();
        for (k, v) in input.iter() {
            let child = ctx.child_key(k);
            let out_key = match &self.key {
                Some(_) => match key(&Value::from(k.as_str()), &child) {
                    Ok(output) => Some(record_key(k, &output)),
                    Err(e) => {
                        errors.extend(e);
                        None
                    }
                },
                None => Some(k.clone()),
            };
            match (out_key, val(v, &child)) {
                (_, Ok(Value::Undefined)) | (None, Ok(_)) => {}
                (Some(out_key), Ok(output)) => {
                    out.insert(out_key, output);
                }
                (_, Err(e)) => errors.extend(e),
            }
        }
        finish(errors, Value::from(out))
    }

    pub(crate) fn check<K, V>(&self, value: &Value, depth: usize, key_is: K, val_is: V) -> bool
    where
        K: Fn(&Value, usize) -> bool,
        V: Fn(&Value, usize) -> bool,
    {
        let Value::Object(input) = value else {
            return false;
        };
        object_guard::check_object(input, depth, &self.limits).is_ok()
            && input.iter().all(|(k, v)| {
                (self.key.is_none() || key_is(&Value::from(k.as_str()), depth + 1))
                    && val_is(v, depth + 1)
            })
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let input = self.input(value, &ctx)?;
        let mut out = Object::with_capacity(input.len());
        let mut errors = Vec::new();
        for (k, v) in input.iter() {
            let child = ctx.child_key(k);
            let out_key = match &self.key {
                Some(schema) => {
                    let key_value = Value::from(k.as_str());
                    match schema.validate_async_in(&key_value, child.clone()).await {
                        Ok(output) => Some(record_key(k, &output)),
                        Err(e) => {
                            errors.extend(e);
                            None
                        }
                    }
                }
                None => Some(k.clone()),
            };
            match (out_key, self.value.validate_async_in(v, child).await) {
                (_, Ok(Value::Undefined)) | (None, Ok(_)) => {}
                (Some(out_key), Ok(output)) => {
                    out.insert(out_key, output);
                }
                (_, Err(e)) => errors.extend(e),
            }
        }
        finish(errors, Value::from(out))
    }
}

impl Validate for RecordSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(
            value,
            ctx,
            |k, c| match &self.key {
                Some(schema) => schema.validate_in(k, c),
                None => Ok(k.clone()),
            },
            |v, c| self.value.validate_in(v, c),
        )
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(
            value,
            depth,
            |k, d| self.key.as_ref().is_none_or(|schema| schema.is_in(k, d)),
            |v, d| self.value.is_in(v, d),
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

// ============================================================================
// MAP
// ============================================================================

/// Accepts native maps; every entry's key and value are validated.
///
/// Errors for entry `i` are reported at `i.key` and `i.value`.
#[derive(Debug, Clone)]
pub struct MapSchema {
    key: Schema,
    value: Schema,
    limits: SecurityLimits,
}

/// A map from `key` to `value`.
pub fn map(key: impl Into<Schema>, value: impl Into<Schema>) -> MapSchema {
    MapSchema {
        key: key.into(),
        value: value.into(),
        limits: SecurityLimits::default(),
    }
}

impl MapSchema {
    #[must_use = "builder methods must be chained or built"]
    pub const fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn key_schema(&self) -> &Schema {
        &self.key
    }

    #[must_use]
    pub const fn value_schema(&self) -> &Schema {
        &self.value
    }

    fn entries<'v>(
        &self,
        value: &'v Value,
        ctx: &ValidationContext,
    ) -> Result<&'v [(Value, Value)], ValidationError> {
        let Value::Map(entries) = value else {
            return Err(ctx.type_mismatch(ErrorCode::NotMap, "map", value));
        };
        object_guard::check_depth(ctx.depth(), &self.limits).map_err(|e| ctx.violation(&e))?;
        Ok(entries)
    }

    pub(crate) fn run<K, V>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        key: K,
        val: V,
    ) -> ValidationResult
    where
        K: Fn(&Value, &ValidationContext) -> ValidationResult,
        V: Fn(&Value, &ValidationContext) -> ValidationResult,
    {
        let entries = self.entries(value, ctx)?;
        let mut out = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();
        for (i, (k, v)) in entries.iter().enumerate() {
            let entry = ctx.child_index(i);
            let k = key(k, &entry.at_key("key"));
            let v = val(v, &entry.at_key("value"));
            match (k, v) {
                (Ok(k), Ok(v)) => out.push((k, v)),
                (k, v) => {
                    errors.extend(k.err().into_iter().flatten());
                    errors.extend(v.err().into_iter().flatten());
                }
            }
        }
        finish(errors, Value::map(out))
    }

    pub(crate) fn check<K, V>(&self, value: &Value, depth: usize, key_is: K, val_is: V) -> bool
    where
        K: Fn(&Value, usize) -> bool,
        V: Fn(&Value, usize) -> bool,
    {
        let Value::Map(entries) = value else {
            return false;
        };
        object_guard::check_depth(depth, &self.limits).is_ok()
            && entries
                .iter()
                .all(|(k, v)| key_is(k, depth + 1) && val_is(v, depth + 1))
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let entries = self.entries(value, &ctx)?;
        let mut out = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();
        for (i, (k, v)) in entries.iter().enumerate() {
            let entry = ctx.child_index(i);
            let k = self.key.validate_async_in(k, entry.at_key("key")).await;
            let v = self.value.validate_async_in(v, entry.at_key("value")).await;
            match (k, v) {
                (Ok(k), Ok(v)) => out.push((k, v)),
                (k, v) => {
                    errors.extend(k.err().into_iter().flatten());
                    errors.extend(v.err().into_iter().flatten());
                }
            }
        }
        finish(errors, Value::map(out))
    }
}

impl Validate for MapSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(
            value,
            ctx,
            |k, c| self.key.validate_in(k, c),
            |v, c| self.value.validate_in(v, c),
        )
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(
            value,
            depth,
            |k, d| self.key.is_in(k, d),
            |v, d| self.value.is_in(v, d),
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

// ============================================================================
// SET
// ============================================================================

/// Accepts native sets whose elements all match one schema.
#[derive(Debug, Clone)]
pub struct SetSchema {
    element: Schema,
    min: Option<usize>,
    max: Option<usize>,
    limits: SecurityLimits,
}

/// A set of `element`.
pub fn set(element: impl Into<Schema>) -> SetSchema {
    SetSchema {
        element: element.into(),
        min: None,
        max: None,
        limits: SecurityLimits::default(),
    }
}

impl SetSchema {
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
    pub const fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn element(&self) -> &Schema {
        &self.element
    }

    fn elements<'v>(
        &self,
        value: &'v Value,
        ctx: &ValidationContext,
    ) -> Result<&'v [Value], ValidationError> {
        let Value::Set(items) = value else {
            return Err(ctx.type_mismatch(ErrorCode::NotSet, "set", value));
        };
        object_guard::check_depth(ctx.depth(), &self.limits).map_err(|e| ctx.violation(&e))?;
        let len = items.len();
        if let Some(n) = self.min.filter(|n| len < *n) {
            return Err(ctx
                .error(
                    ErrorCode::SetTooSmall,
                    format!("Set must contain at least {n} element(s)"),
                )
                .with_meta("minimum", n));
        }
        if let Some(n) = self.max.filter(|n| len > *n) {
            return Err(ctx
                .error(
                    ErrorCode::SetTooBig,
                    format!("Set must contain at most {n} element(s)"),
                )
                .with_meta("maximum", n));
        }
        Ok(items)
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
        let items = self.elements(value, ctx)?;
        let mut out = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (i, item) in items.iter().enumerate() {
            match element(item, &ctx.child_index(i)) {
                Ok(v) => out.push(v),
                Err(e) => errors.extend(e),
            }
        }
        finish(errors, Value::set(out))
    }

    pub(crate) fn check<F>(&self, value: &Value, depth: usize, element_is: F) -> bool
    where
        F: Fn(&Value, usize) -> bool,
    {
        let Value::Set(items) = value else {
            return false;
        };
        let len = items.len();
        object_guard::check_depth(depth, &self.limits).is_ok()
            && self.min.is_none_or(|n| len >= n)
            && self.max.is_none_or(|n| len <= n)
            && items.iter().all(|item| element_is(item, depth + 1))
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let items = self.elements(value, &ctx)?;
        let mut out = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (i, item) in items.iter().enumerate() {
            match self.element.validate_async_in(item, ctx.child_index(i)).await {
                Ok(v) => out.push(v),
                Err(e) => errors.extend(e),
            }
        }
        finish(errors, Value::set(out))
    }
}

impl Validate for SetSchema {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::SchemaExt;
    use crate::validators::{enumeration, number, string};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_record_validates_every_entry() {
        let scores = record(number().int());
        assert!(scores.is(&Value::from(json!({"alice": 1, "bob": 2}))));

        let err = scores
            .validate(&Value::from(json!({"alice": 1, "bob": "x"})))
            .unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::NotNumber]);
        assert_eq!(err.first().path, "bob");
    }

    #[test]
    fn test_record_key_schema() {
        let flags = record(crate::validators::boolean()).keys(enumeration(["a", "b"]));
        assert!(flags.is(&Value::from(json!({"a": true}))));
        let err = flags.validate(&Value::from(json!({"c": true}))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::InvalidEnumValue]);
        assert_eq!(err.first().path, "c");
        assert!(!flags.is(&Value::from(json!({"c": true}))));
    }

    #[test]
    fn test_record_keys_can_be_transformed() {
        let upper = record(number()).keys(string().to_uppercase());
        let out = upper.validate(&Value::from(json!({"a": 1}))).unwrap();
        assert_eq!(out, Value::from(json!({"A": 1})));
    }

    #[test]
    fn test_record_is_guarded() {
        let err = record(crate::validators::any())
            .validate(&Value::from(json!({"__proto__": {}})))
            .unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::SecurityDangerousKey]);
    }

    #[test]
    fn test_map_entry_paths() {
        let schema = map(string(), number());
        let input = Value::map([
            (Value::from("a"), Value::from(1)),
            (Value::from(2), Value::from("x")),
        ]);
        let err = schema.validate(&input).unwrap_err();
        let paths: Vec<&str> = err.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["1.key", "1.value"]);
        assert!(!schema.is(&input));

        let err = schema.validate(&Value::from(json!({}))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::NotMap]);
    }

    #[test]
    fn test_set_size_and_elements() {
        let tags = set(string()).min(1).max(2);
        assert!(tags.is(&Value::set(["a", "b"])));
        assert_eq!(
            tags.validate(&Value::set(Vec::<Value>::new())).unwrap_err().codes(),
            vec![ErrorCode::SetTooSmall]
        );
        assert_eq!(
            tags.validate(&Value::set(["a", "b", "c"])).unwrap_err().codes(),
            vec![ErrorCode::SetTooBig]
        );
        let err = tags.validate(&Value::set([Value::from(1)])).unwrap_err();
        assert_eq!(err.first().path, "0");
        assert_eq!(
            set(string()).validate(&Value::from(json!(["a"]))).unwrap_err().codes(),
            vec![ErrorCode::NotSet]
        );
    }

    #[test]
    fn test_set_output_dedupes_transformed_elements() {
        let lower = set(string().to_lowercase());
        let out = lower.validate(&Value::set(["A", "a"])).unwrap();
        assert_eq!(out, Value::set(["a"]));
        assert!(lower.optional().is(&Value::Undefined));
    }
}
