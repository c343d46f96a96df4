//! Literal, enum and native-enum schemas

use std::fmt::Write as _;
use std::sync::Arc;

use crate::foundation::{ErrorCode, Validate, ValidationContext, ValidationResult};
use crate::value::Value;

// ============================================================================
// LITERAL
// ============================================================================

/// Accepts exactly one value (SameValueZero).
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralSchema {
    value: Value,
}

/// A schema accepting only `value`.
pub fn literal(value: impl Into<Value>) -> LiteralSchema {
    LiteralSchema {
        value: value.into(),
    }
}

impl LiteralSchema {
    /// The accepted value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

impl Validate for LiteralSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        if self.value.same_value_zero(value) {
            return Ok(value.clone());
        }
        Err(ctx
            .error(
                ErrorCode::InvalidLiteral,
                format!("Invalid literal value, expected {}", self.value),
            )
            .with_expected(self.value.to_string())
            .with_received(value.clone())
            .into())
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        self.value.same_value_zero(value)
    }
}

// ============================================================================
// ENUM
// ============================================================================

/// Accepts one of a fixed list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    options: Arc<[Arc<str>]>,
}

/// A schema accepting any of `options`.
pub fn enumeration<S, I>(options: I) -> EnumSchema
where
    S: Into<Arc<str>>,
    I: IntoIterator<Item = S>,
{
    EnumSchema {
        options: options.into_iter().map(Into::into).collect(),
    }
}

impl EnumSchema {
    #[must_use]
    pub fn options(&self) -> &[Arc<str>] {
        &self.options
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::String(s) if self.options.iter().any(|o| o == s))
    }

    fn expected(&self) -> String {
        let mut out = String::new();
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            let _ = write!(out, "'{option}'");
        }
        out
    }
}

impl Validate for EnumSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        if self.accepts(value) {
            return Ok(value.clone());
        }
        let expected = self.expected();
        Err(ctx
            .error(
                ErrorCode::InvalidEnumValue,
                format!("Invalid enum value. Expected {expected}, received {value}"),
            )
            .with_expected(expected)
            .with_received(value.clone())
            .into())
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        self.accepts(value)
    }
}

// ============================================================================
// NATIVE ENUM
// ============================================================================

/// Accepts any value of a name-to-value table.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEnumSchema {
    entries: Arc<[(Arc<str>, Value)]>,
}

/// A schema accepting any value of `entries`, e.g.
/// `native_enum([("Admin", "admin"), ("Guest", "guest")])`.
pub fn native_enum<K, V, I>(entries: I) -> NativeEnumSchema
where
    K: Into<Arc<str>>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    NativeEnumSchema {
        entries: entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    }
}

impl NativeEnumSchema {
    /// Name-to-value table in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[(Arc<str>, Value)] {
        &self.entries
    }

    fn accepts(&self, value: &Value) -> bool {
        self.entries.iter().any(|(_, v)| v.same_value_zero(value))
    }
}

impl Validate for NativeEnumSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        if self.accepts(value) {
            return Ok(value.clone());
        }
        let mut expected = String::new();
        for (i, (_, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                expected.push_str(" | ");
            }
            let _ = write!(expected, "{v}");
        }
        Err(ctx
            .error(
                ErrorCode::InvalidEnumValue,
                format!("Invalid enum value. Expected {expected}, received {value}"),
            )
            .with_expected(expected)
            .with_received(value.clone())
            .into())
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        self.accepts(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matches_exactly() {
        let schema = literal("admin");
        assert!(schema.is(&Value::from("admin")));
        let err = schema.validate(&Value::from("user")).unwrap_err();
        assert_eq!(err.first().code, ErrorCode::InvalidLiteral);
        assert_eq!(err.first().expected.as_deref(), Some("\"admin\""));
    }

    #[test]
    fn test_literal_number_does_not_match_string() {
        assert!(!literal(1).is(&Value::from("1")));
        assert!(literal(f64::NAN).is(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_enumeration_membership() {
        let schema = enumeration(["red", "green"]);
        assert!(schema.is(&Value::from("green")));
        let err = schema.validate(&Value::from("blue")).unwrap_err();
        assert_eq!(err.first().code, ErrorCode::InvalidEnumValue);
        assert_eq!(
            err.first().message,
            "Invalid enum value. Expected 'red' | 'green', received \"blue\""
        );
    }

    #[test]
    fn test_native_enum_accepts_values_not_names() {
        let schema = native_enum([("Admin", Value::from("admin")), ("Level", Value::from(3))]);
        assert!(schema.is(&Value::from("admin")));
        assert!(schema.is(&Value::from(3)));
        assert!(!schema.is(&Value::from("Admin")));
    }
}
