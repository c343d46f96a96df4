//! Object schema
//!
//! Validation order for an object node:
//!
//! 1. non-objects (arrays included) fail with `NOT_OBJECT`;
//! 2. the object guard runs (depth, then dangerous keys);
//! 3. every declared field is validated against `input[key]`, or
//!    `undefined` when absent. All field errors are collected;
//!    `undefined` outputs are left out of the result;
//! 4. keys not in the shape are handled by the [`UnknownKeys`] policy.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::combinators::{ModifiedSchema, Modifier, SchemaExt};
use crate::foundation::{
    ErrorCode, Validate, ValidationContext, ValidationError, ValidationErrors, ValidationResult,
    finish,
};
use crate::schema::{Schema, SchemaKind};
use crate::security::{SecurityLimits, object_guard};
use crate::validators::{EnumSchema, enumeration};
use crate::value::{Object, UNDEFINED, Value};

/// What to do with input keys the shape does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Copy them to the output unchanged (after the object guard scanned
    /// them).
    Passthrough,
    /// Report each one as `OBJECT_UNKNOWN_KEY`.
    Strict,
}

/// Accepts plain objects with a declared shape.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    shape: Arc<IndexMap<String, Schema>>,
    unknown_keys: UnknownKeys,
    limits: SecurityLimits,
}

/// An object schema with the given fields, in declaration order.
///
/// The [`object!`](crate::object) macro is the usual way to call this.
pub fn object<K, S, I>(fields: I) -> ObjectSchema
where
    K: Into<String>,
    S: Into<Schema>,
    I: IntoIterator<Item = (K, S)>,
{
    ObjectSchema {
        shape: Arc::new(
            fields
                .into_iter()
                .map(|(k, s)| (k.into(), s.into()))
                .collect(),
        ),
        ..<ObjectSchema as Default>::default()
    }
}

impl ObjectSchema {
    /// Declared fields in order.
    #[must_use]
    pub fn shape(&self) -> &IndexMap<String, Schema> {
        &self.shape
    }

    /// Schema of one field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Schema> {
        self.shape.get(key)
    }

    #[must_use]
    pub const fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    #[must_use]
    pub const fn security_limits(&self) -> &SecurityLimits {
        &self.limits
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn strip(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strip;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    /// Security limits for this node.
    #[must_use = "builder methods must be chained or built"]
    pub const fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    fn with_shape(&self, shape: IndexMap<String, Schema>) -> Self {
        Self {
            shape: Arc::new(shape),
            unknown_keys: self.unknown_keys,
            limits: self.limits,
        }
    }

    /// Adds fields; a key already present is replaced in place.
    #[must_use = "builder methods must be chained or built"]
    pub fn extend<K, S, I>(self, fields: I) -> Self
    where
        K: Into<String>,
        S: Into<Schema>,
        I: IntoIterator<Item = (K, S)>,
    {
        let mut shape = (*self.shape).clone();
        for (k, s) in fields {
            shape.insert(k.into(), s.into());
        }
        self.with_shape(shape)
    }

    /// Fields of `other` added to (and overriding) this shape; the unknown
    /// key policy of `other` wins.
    #[must_use = "builder methods must be chained or built"]
    pub fn merge(self, other: &Self) -> Self {
        let merged = self.extend(
            other
                .shape
                .iter()
                .map(|(k, s)| (k.clone(), s.clone())),
        );
        Self {
            unknown_keys: other.unknown_keys,
            ..merged
        }
    }

    /// Only the listed fields.
    #[must_use = "builder methods must be chained or built"]
    pub fn pick(&self, keys: &[&str]) -> Self {
        self.with_shape(
            self.shape
                .iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .map(|(k, s)| (k.clone(), s.clone()))
                .collect(),
        )
    }

    /// Every field except the listed ones.
    #[must_use = "builder methods must be chained or built"]
    pub fn omit(&self, keys: &[&str]) -> Self {
        self.with_shape(
            self.shape
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, s)| (k.clone(), s.clone()))
                .collect(),
        )
    }

    /// Every field made optional.
    #[must_use = "builder methods must be chained or built"]
    pub fn partial(&self) -> Self {
        self.with_shape(
            self.shape
                .iter()
                .map(|(k, s)| (k.clone(), s.clone().optional()))
                .collect(),
        )
    }

    /// Every field with its outer `optional` wrappers removed.
    #[must_use = "builder methods must be chained or built"]
    pub fn required(&self) -> Self {
        fn unwrap_optional(schema: &Schema) -> Schema {
            match schema.kind() {
                SchemaKind::Modified(m) if matches!(m.modifier(), Modifier::Optional) => {
                    unwrap_optional(m.inner())
                }
                SchemaKind::Modified(m) if matches!(m.modifier(), Modifier::Nullish) => {
                    ModifiedSchema::new(unwrap_optional(m.inner()), Modifier::Nullable).into()
                }
                _ => schema.clone(),
            }
        }
        self.with_shape(
            self.shape
                .iter()
                .map(|(k, s)| (k.clone(), unwrap_optional(s)))
                .collect(),
        )
    }

    /// Enum of the declared keys.
    #[must_use]
    pub fn keyof(&self) -> EnumSchema {
        enumeration(self.shape.keys().map(String::as_str))
    }

    // ------------------------------------------------------------------------
    // Traversal shared with the compiler
    // ------------------------------------------------------------------------

    /// Type check and object guard.
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

    fn unknown(
        &self,
        input: &Object,
        ctx: &ValidationContext,
        out: &mut Object,
        errors: &mut Vec<ValidationError>,
    ) {
        let extra = input.iter().filter(|(k, _)| !self.shape.contains_key(*k));
        match self.unknown_keys {
            UnknownKeys::Strip => {}
            UnknownKeys::Passthrough => {
                for (key, value) in extra {
                    match object_guard::scan(value, &ctx.child_key(key), &self.limits) {
                        Ok(()) => {
                            out.insert(key.clone(), value.clone());
                        }
                        Err(error) => errors.push(error),
                    }
                }
            }
            UnknownKeys::Strict => {
                for (key, _) in extra {
                    let message = format!("Unrecognized key: {key:?}");
                    errors.push(ctx.child_key(key).error(ErrorCode::ObjectUnknownKey, message));
                }
            }
        }
    }

    fn collect(
        key: &str,
        result: ValidationResult,
        out: &mut Object,
        errors: &mut Vec<ValidationError>,
    ) {
        match result {
            Ok(Value::Undefined) => {}
            Ok(value) => {
                out.insert(key.to_owned(), value);
            }
            Err(e) => errors.extend(e),
        }
    }

    /// Validates `value`; `field(i, v, ctx)` validates the `i`-th declared
    /// field.
    pub(crate) fn run<F>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        field: F,
    ) -> ValidationResult
    where
        F: Fn(usize, &Value, &ValidationContext) -> ValidationResult,
    {
        let input = self.input(value, ctx)?;
        let mut out = Object::with_capacity(self.shape.len());
        let mut errors = Vec::new();
        for (i, key) in self.shape.keys().enumerate() {
            let child = input.get(key).unwrap_or(&UNDEFINED);
            Self::collect(key, field(i, child, &ctx.child_key(key)), &mut out, &mut errors);
        }
        self.unknown(input, ctx, &mut out, &mut errors);
        finish(errors, Value::from(out))
    }

    /// Boolean form of [`run`](Self::run).
    pub(crate) fn check<F>(&self, value: &Value, depth: usize, field_is: F) -> bool
    where
        F: Fn(usize, &Value, usize) -> bool,
    {
        let Value::Object(input) = value else {
            return false;
        };
        if object_guard::check_object(input, depth, &self.limits).is_err() {
            return false;
        }
        let fields_ok = self
            .shape
            .keys()
            .enumerate()
            .all(|(i, key)| field_is(i, input.get(key).unwrap_or(&UNDEFINED), depth + 1));
        fields_ok
            && match self.unknown_keys {
                UnknownKeys::Strip => true,
                UnknownKeys::Passthrough => input
                    .iter()
                    .filter(|(k, _)| !self.shape.contains_key(*k))
                    .all(|(_, v)| object_guard::scan_ok(v, depth + 1, &self.limits)),
                UnknownKeys::Strict => input.keys().all(|k| self.shape.contains_key(k)),
            }
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let input = self.input(value, &ctx).map_err(ValidationErrors::single)?;
        let mut out = Object::with_capacity(self.shape.len());
        let mut errors = Vec::new();
        for (key, schema) in self.shape.iter() {
            let child = input.get(key).unwrap_or(&UNDEFINED);
            let result = schema.validate_async_in(child, ctx.child_key(key)).await;
            Self::collect(key, result, &mut out, &mut errors);
        }
        self.unknown(input, &ctx, &mut out, &mut errors);
        finish(errors, Value::from(out))
    }
}

impl Validate for ObjectSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(value, ctx, |i, v, c| self.shape[i].validate_in(v, c))
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(value, depth, |i, v, d| self.shape[i].is_in(v, d))
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
    use serde_json::json;

    fn user() -> ObjectSchema {
        object([
            ("name", Schema::from(string().min(1))),
            ("age", number().int().optional()),
        ])
    }

    #[test]
    fn test_arrays_are_not_objects() {
        let err = user().validate(&Value::from(json!([]))).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::NotObject]);
    }

    #[test]
    fn test_collects_every_field_error() {
        let err = user()
            .validate(&Value::from(json!({"name": "", "age": 1.5})))
            .unwrap_err();
        assert_eq!(
            err.codes(),
            vec![ErrorCode::StringTooShort, ErrorCode::NumberNotInteger]
        );
        assert_eq!(err.as_slice()[0].path, "name");
        assert_eq!(err.as_slice()[1].path, "age");
    }

    #[test]
    fn test_absent_optional_fields_are_not_written_back() {
        let out = user().validate(&Value::from(json!({"name": "a"}))).unwrap();
        assert_eq!(out, Value::from(json!({"name": "a"})));
    }

    #[test]
    fn test_unknown_key_policies() {
        let input = Value::from(json!({"name": "a", "extra": 1}));
        assert_eq!(
            user().validate(&input).unwrap(),
            Value::from(json!({"name": "a"}))
        );
        assert_eq!(user().passthrough().validate(&input).unwrap(), input);

        let err = user().strict().validate(&input).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::ObjectUnknownKey]);
        assert_eq!(err.first().path, "extra");
        assert_eq!(err.first().message, "Unrecognized key: \"extra\"");
        assert!(!user().strict().is(&input));
    }

    #[test]
    fn test_dangerous_keys_fail_in_every_mode() {
        let input = Value::from(json!({"name": "a", "__proto__": {"polluted": true}}));
        for schema in [user(), user().passthrough(), user().strict()] {
            let err = schema.validate(&input).unwrap_err();
            assert_eq!(err.codes(), vec![ErrorCode::SecurityDangerousKey]);
            assert!(!schema.is(&input));
        }
    }

    #[test]
    fn test_passthrough_scans_copied_values() {
        let input = Value::from(json!({"name": "a", "extra": {"constructor": {}}}));
        let err = user().passthrough().validate(&input).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::SecurityDangerousKey]);
        assert_eq!(err.first().path, "extra");
        assert!(user().validate(&input).is_ok());
    }

    #[test]
    fn test_depth_limit_applies_to_its_own_node() {
        let limits = SecurityLimits::default().with_max_depth(1);
        let leaf = object::<&str, Schema, _>([]).limits(limits);
        let schema = object([("a", object([("b", leaf)]))]);
        let input = Value::from(json!({"a": {"b": {}}}));

        let err = schema.validate(&input).unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::SecurityMaxDepth]);
        assert_eq!(err.first().path, "a.b");
        assert!(!schema.is(&input));

        let outer_only =
            object([("a", object([("b", object::<&str, Schema, _>([]))]))]).limits(limits);
        assert!(outer_only.is(&input));
    }

    #[test]
    fn test_public_builder_constructs_object() {
        let schema = crate::prelude::object([("id", crate::prelude::number())]);
        assert_eq!(schema.unknown_keys(), UnknownKeys::Strip);
        assert_eq!(schema.shape().len(), 1);
        assert!(schema.is(&Value::from(json!({"id": 1}))));
    }

    #[test]
    fn test_shape_algebra() {
        let base = user();
        let extended = base.clone().extend([("email", string().email())]);
        assert_eq!(extended.shape().len(), 3);
        assert_eq!(base.shape().len(), 2);

        let picked = extended.pick(&["email"]);
        assert_eq!(picked.shape().keys().collect::<Vec<_>>(), vec!["email"]);

        let omitted = extended.omit(&["email"]);
        assert_eq!(omitted.shape().len(), 2);

        let partial = base.partial();
        assert!(partial.is(&Value::from(json!({}))));

        let required = partial.required();
        assert!(!required.is(&Value::from(json!({"name": "a"}))));
        assert!(required.is(&Value::from(json!({"name": "a", "age": 3}))));

        let merged = base.merge(&object([("name", number())]).strict());
        assert_eq!(merged.unknown_keys(), UnknownKeys::Strict);
        assert!(merged.is(&Value::from(json!({"name": 1}))));

        assert!(user().keyof().is(&Value::from("age")));
        assert!(!user().keyof().is(&Value::from("email")));
    }
}
