//! Error types for validation failures
//!
//! A failed validation produces [`ValidationErrors`]: a non-empty, ordered
//! list of flat [`ValidationError`]s. Composites do not nest errors; each
//! child failure carries the full dot-joined path of the value that failed
//! (`user.roles.0`), so the list can be rendered or serialized directly.
//!
//! Messages use `Cow<'static, str>` so static messages never allocate.

use std::borrow::Cow;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
use smallvec::SmallVec;

use super::code::ErrorCode;
use crate::value::Value;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// A single validation failure.
///
/// ```rust,ignore
/// use warden_validator::foundation::{ErrorCode, ValidationError};
///
/// let error = ValidationError::new(ErrorCode::StringTooShort, "Must be at least 3 characters")
///     .with_path("user.name")
///     .with_meta("min", 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Dot-joined location of the failing value; empty at the root.
    pub path: String,

    /// Machine-readable failure code.
    pub code: ErrorCode,

    /// Human-readable message.
    pub message: Cow<'static, str>,

    /// The offending value, when the node chose to record it.
    pub received: Option<Value>,

    /// Description of what was expected (`"string"`, `"\"admin\""`, ...).
    pub expected: Option<Cow<'static, str>>,

    /// Extra parameters such as the violated bound.
    pub meta: SmallVec<[(Cow<'static, str>, Value); 2]>,
}

impl ValidationError {
    /// Creates an error at the root path.
    pub fn new(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            path: String::new(),
            code,
            message: message.into(),
            received: None,
            expected: None,
            meta: SmallVec::new(),
        }
    }

    /// Sets the path.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Records the offending value.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_received(mut self, value: Value) -> Self {
        self.received = Some(value);
        self
    }

    /// Records what was expected.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_expected(mut self, expected: impl Into<Cow<'static, str>>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Adds a meta parameter.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_meta(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.meta.push((key.into(), value.into()));
        self
    }

    /// Looks up a meta parameter by key.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.code, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.path, self.code, self.message)
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Meta<'a>(&'a [(Cow<'static, str>, Value)]);

        impl Serialize for Meta<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (k, v) in self.0 {
                    map.serialize_entry(k.as_ref(), v)?;
                }
                map.end()
            }
        }

        let len = 3
            + usize::from(self.received.is_some())
            + usize::from(self.expected.is_some())
            + usize::from(!self.meta.is_empty());
        let mut out = serializer.serialize_struct("ValidationError", len)?;
        out.serialize_field("path", &self.path)?;
        out.serialize_field("code", &self.code)?;
        out.serialize_field("message", self.message.as_ref())?;
        if let Some(received) = &self.received {
            out.serialize_field("received", received)?;
        }
        if let Some(expected) = &self.expected {
            out.serialize_field("expected", expected.as_ref())?;
        }
        if !self.meta.is_empty() {
            out.serialize_field("meta", &Meta(&self.meta))?;
        }
        out.end()
    }
}

// ============================================================================
// ERROR COLLECTION
// ============================================================================

/// The failure side of a [`ValidationResult`]: at least one error, in the
/// order the nodes reported them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", render(.errors))]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

fn render(errors: &[ValidationError]) -> String {
    use fmt::Write;

    let mut out = format!("Validation failed with {} error(s):", errors.len());
    for (i, error) in errors.iter().enumerate() {
        let _ = write!(out, "\n  {}. {}", i + 1, error);
    }
    out
}

#[allow(clippy::len_without_is_empty)]
impl ValidationErrors {
    /// Wraps a single error.
    #[must_use]
    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Wraps a list of errors; `None` when the list is empty.
    #[must_use]
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Number of errors; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The first reported error.
    #[must_use]
    pub fn first(&self) -> &ValidationError {
        &self.errors[0]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Codes in report order.
    #[must_use]
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    /// Errors reported at exactly `path`.
    pub fn at_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.errors.iter().filter(move |e| e.path == path)
    }

    /// `true` if any error carries `code`.
    #[must_use]
    pub fn contains(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Replaces the message of every error reported at `path`.
    pub(crate) fn override_message(&mut self, path: &str, message: &Cow<'static, str>) {
        for error in self.errors.iter_mut().filter(|e| e.path == path) {
            error.message = message.clone();
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.errors.serialize(serializer)
    }
}

/// Outcome of validating one value: the (possibly transformed) data, or
/// every error found.
pub type ValidationResult<T = Value> = Result<T, ValidationErrors>;

/// Turns collected errors into a result: `Ok(data)` when nothing failed.
pub(crate) fn finish(errors: Vec<ValidationError>, data: Value) -> ValidationResult {
    ValidationErrors::from_vec(errors).map_or(Ok(data), Err)
}

// ============================================================================
// SCHEMA CONSTRUCTION ERRORS
// ============================================================================

/// Misuse detected while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A discriminated-union option does not declare the discriminator as a
    /// literal field.
    #[error("option {index} has no literal field `{discriminator}`")]
    MissingDiscriminator { discriminator: String, index: usize },

    /// Two discriminated-union options share a discriminator value.
    #[error("discriminator value {value} is used by more than one option")]
    DuplicateDiscriminator { value: String },
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let error = ValidationError::new(ErrorCode::StringTooShort, "too short")
            .with_path("user.name")
            .with_meta("min", 3);
        assert_eq!(error.path, "user.name");
        assert_eq!(error.meta("min"), Some(&Value::Number(3.0)));
        assert_eq!(error.to_string(), "[user.name] STRING_TOO_SHORT: too short");
    }

    #[test]
    fn test_root_display_has_no_path() {
        let error = ValidationError::new(ErrorCode::NotString, "Expected string, received number");
        assert_eq!(error.to_string(), "NOT_STRING: Expected string, received number");
    }

    #[test]
    fn test_static_message_is_borrowed() {
        let error = ValidationError::new(ErrorCode::Never, "never");
        assert!(matches!(error.message, Cow::Borrowed(_)));
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let error = ValidationError::new(ErrorCode::NotNumber, "Expected number, received string")
            .with_path("age")
            .with_expected("number");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            json!({
                "path": "age",
                "code": "NOT_NUMBER",
                "message": "Expected number, received string",
                "expected": "number",
            })
        );
    }

    #[test]
    fn test_serialize_meta_as_map() {
        let error = ValidationError::new(ErrorCode::NumberTooSmall, "too small")
            .with_received(Value::from(1))
            .with_meta("minimum", 5);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["meta"], json!({"minimum": 5.0}));
        assert_eq!(json["received"], json!(1.0));
    }

    #[test]
    fn test_collection_is_never_empty() {
        assert!(ValidationErrors::from_vec(Vec::new()).is_none());
        let errors = ValidationErrors::from_vec(vec![
            ValidationError::new(ErrorCode::NotString, "a").with_path("a"),
            ValidationError::new(ErrorCode::NotNumber, "b").with_path("b"),
        ])
        .unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.codes(), vec![ErrorCode::NotString, ErrorCode::NotNumber]);
        assert_eq!(errors.at_path("b").count(), 1);
        assert!(errors.contains(ErrorCode::NotNumber));
    }

    #[test]
    fn test_collection_display() {
        let errors = ValidationErrors::single(
            ValidationError::new(ErrorCode::NotString, "Expected string").with_path("name"),
        );
        assert_eq!(
            errors.to_string(),
            "Validation failed with 1 error(s):\n  1. [name] NOT_STRING: Expected string"
        );
    }

    #[test]
    fn test_override_message_only_touches_path() {
        let mut errors = ValidationErrors::from_vec(vec![
            ValidationError::new(ErrorCode::NotString, "a"),
            ValidationError::new(ErrorCode::NotString, "b").with_path("x"),
        ])
        .unwrap();
        errors.override_message("", &Cow::Borrowed("custom"));
        assert_eq!(errors.as_slice()[0].message, "custom");
        assert_eq!(errors.as_slice()[1].message, "b");
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::MissingDiscriminator {
            discriminator: "type".into(),
            index: 1,
        };
        assert_eq!(err.to_string(), "option 1 has no literal field `type`");
    }
}
