//! Union and discriminated union schemas

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::foundation::{
    ErrorCode, SchemaError, Validate, ValidationContext, ValidationError, ValidationResult,
};
use crate::schema::{Schema, SchemaKind};
use crate::validators::ObjectSchema;
use crate::value::{Object, Value, ValueKey};

// ============================================================================
// UNION
// ============================================================================

/// Accepts a value matching any option; the first matching option in
/// declaration order produces the output.
///
/// When every option fails, a single `UNION_NO_MATCH` is reported at the
/// union's path; the options' own errors are discarded.
#[derive(Debug, Clone)]
pub struct UnionSchema {
    options: Arc<[Schema]>,
}

/// A union of `options`.
pub fn union<S, I>(options: I) -> UnionSchema
where
    S: Into<Schema>,
    I: IntoIterator<Item = S>,
{
    UnionSchema::new(options)
}

impl UnionSchema {
    pub fn new<S, I>(options: I) -> Self
    where
        S: Into<Schema>,
        I: IntoIterator<Item = S>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &[Schema] {
        &self.options
    }

    fn no_match(&self, ctx: &ValidationContext) -> ValidationError {
        ctx.error(
            ErrorCode::UnionNoMatch,
            "Invalid input: value does not match any union option",
        )
        .with_meta("options", self.options.len())
    }

    pub(crate) fn run<F>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        option: F,
    ) -> ValidationResult
    where
        F: Fn(usize, &Value, &ValidationContext) -> ValidationResult,
    {
        (0..self.options.len())
            .find_map(|i| option(i, value, ctx).ok())
            .ok_or_else(|| self.no_match(ctx).into())
    }

    pub(crate) fn check<F>(&self, value: &Value, depth: usize, option_is: F) -> bool
    where
        F: Fn(usize, &Value, usize) -> bool,
    {
        (0..self.options.len()).any(|i| option_is(i, value, depth))
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        for option in self.options.iter() {
            if let Ok(output) = option.validate_async_in(value, ctx.clone()).await {
                return Ok(output);
            }
        }
        Err(self.no_match(&ctx).into())
    }
}

impl Validate for UnionSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(value, ctx, |i, v, c| self.options[i].validate_in(v, c))
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(value, depth, |i, v, d| self.options[i].is_in(v, d))
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
// DISCRIMINATED UNION
// ============================================================================

/// A union of object schemas selected by the value of one literal field.
///
/// The option is found through a table built at construction, so lookup
/// cost does not grow with the number of options. Only the selected option
/// validates the input, and its errors are reported as-is.
#[derive(Debug, Clone)]
pub struct DiscriminatedUnionSchema {
    discriminator: Arc<str>,
    options: Arc<[ObjectSchema]>,
    lookup: Arc<HashMap<ValueKey, usize>>,
}

/// A discriminated union over `options`, keyed by `discriminator`.
///
/// # Errors
///
/// [`SchemaError::MissingDiscriminator`] if an option does not declare the
/// discriminator as a literal field, [`SchemaError::DuplicateDiscriminator`]
/// if two options use the same literal.
pub fn discriminated_union<I>(
    discriminator: &str,
    options: I,
) -> Result<DiscriminatedUnionSchema, SchemaError>
where
    I: IntoIterator<Item = ObjectSchema>,
{
    DiscriminatedUnionSchema::new(discriminator, options)
}

impl DiscriminatedUnionSchema {
    pub fn new<I>(discriminator: &str, options: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = ObjectSchema>,
    {
        let options: Arc<[ObjectSchema]> = options.into_iter().collect();
        let mut lookup = HashMap::with_capacity(options.len());
        for (index, option) in options.iter().enumerate() {
            let literal = match option.field(discriminator).map(Schema::kind) {
                Some(SchemaKind::Literal(literal)) => literal.value(),
                _ => {
                    return Err(SchemaError::MissingDiscriminator {
                        discriminator: discriminator.to_owned(),
                        index,
                    });
                }
            };
            if lookup.insert(literal.key(), index).is_some() {
                return Err(SchemaError::DuplicateDiscriminator {
                    value: literal.to_string(),
                });
            }
        }
        Ok(Self {
            discriminator: discriminator.into(),
            options,
            lookup: Arc::new(lookup),
        })
    }

    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    #[must_use]
    pub fn options(&self) -> &[ObjectSchema] {
        &self.options
    }

    fn expected(&self) -> String {
        self.options
            .iter()
            .filter_map(|o| match o.field(&self.discriminator).map(Schema::kind) {
                Some(SchemaKind::Literal(l)) => Some(l.value().to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub(crate) fn select(&self, input: &Object) -> Option<usize> {
        input
            .get(&*self.discriminator)
            .and_then(|tag| self.lookup.get(&tag.key()))
            .copied()
    }

    /// Index of the selected option, or the error to report.
    fn resolve(&self, value: &Value, ctx: &ValidationContext) -> Result<usize, ValidationError> {
        let Value::Object(input) = value else {
            return Err(ctx.type_mismatch(ErrorCode::NotObject, "object", value));
        };
        self.select(input).ok_or_else(|| {
            let expected = self.expected();
            let at = ctx.at_key(&self.discriminator);
            let error = at
                .error(
                    ErrorCode::InvalidDiscriminator,
                    format!("Invalid discriminator value. Expected {expected}"),
                )
                .with_expected(expected);
            match input.get(&*self.discriminator) {
                Some(tag) => error.with_received(tag.clone()),
                None => error,
            }
        })
    }

    pub(crate) fn run<F>(
        &self,
        value: &Value,
        ctx: &ValidationContext,
        option: F,
    ) -> ValidationResult
    where
        F: Fn(usize, &Value, &ValidationContext) -> ValidationResult,
    {
        let index = self.resolve(value, ctx)?;
        option(index, value, ctx)
    }

    pub(crate) fn check<F>(&self, value: &Value, depth: usize, option_is: F) -> bool
    where
        F: Fn(usize, &Value, usize) -> bool,
    {
        match value {
            Value::Object(input) => self
                .select(input)
                .is_some_and(|index| option_is(index, value, depth)),
            _ => false,
        }
    }

    async fn run_async(&self, value: &Value, ctx: ValidationContext) -> ValidationResult {
        let index = self.resolve(value, &ctx)?;
        self.options[index].validate_async_in(value, ctx).await
    }
}

impl Validate for DiscriminatedUnionSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        self.run(value, ctx, |i, v, c| self.options[i].validate_in(v, c))
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        self.check(value, depth, |i, v, d| self.options[i].is_in(v, d))
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        self.run_async(value, ctx).boxed()
    }
}
