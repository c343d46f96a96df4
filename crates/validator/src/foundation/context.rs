//! Per-call validation state threaded through the schema tree.

use std::borrow::Cow;
use std::fmt;

use super::code::ErrorCode;
use super::error::ValidationError;
use crate::value::Value;

/// Location of the value currently being validated.
///
/// The path is a dot-joined list of object keys and array indices
/// (`user.roles.0`); the depth counts container levels from the root and is
/// what the object guard bounds. Contexts are cheap to derive and never
/// mutated, so composites hand each child its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    path: String,
    depth: usize,
}

impl ValidationContext {
    /// Context for the root value.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Root context whose errors are reported under `path`.
    #[must_use]
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            depth: 0,
        }
    }

    /// Root context starting at `depth`.
    #[must_use]
    pub fn with_depth(depth: usize) -> Self {
        Self {
            path: String::new(),
            depth,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Context of the value stored under `key`, one level deeper.
    #[must_use]
    pub fn child_key(&self, key: &str) -> Self {
        Self {
            path: self.join(key),
            depth: self.depth + 1,
        }
    }

    /// Context of the element at `index`, one level deeper.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        Self {
            path: self.join(index),
            depth: self.depth + 1,
        }
    }

    /// Same depth, path extended by `key`. Used for values that sit beside
    /// the current one rather than inside it (a map entry's key and value,
    /// a discriminator field).
    #[must_use]
    pub fn at_key(&self, key: &str) -> Self {
        Self {
            path: self.join(key),
            depth: self.depth,
        }
    }

    fn join(&self, segment: impl fmt::Display) -> String {
        if self.path.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{segment}", self.path)
        }
    }

    /// An error at this location.
    #[must_use]
    pub fn error(&self, code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ValidationError {
        ValidationError::new(code, message).with_path(self.path.clone())
    }

    /// "Expected X, received Y" at this location.
    #[must_use]
    pub fn type_mismatch(
        &self,
        code: ErrorCode,
        expected: &'static str,
        received: &Value,
    ) -> ValidationError {
        self.error(
            code,
            format!("Expected {expected}, received {}", received.type_name()),
        )
        .with_expected(expected)
        .with_received(received.clone())
    }

    /// A security-guard rejection at this location.
    ///
    /// Logged at `warn`; the offending value is never recorded.
    pub fn violation<E>(&self, err: &E) -> ValidationError
    where
        E: fmt::Display + GuardFailure,
    {
        let code = err.code();
        tracing::warn!(code = code.as_str(), path = %self.path, "input rejected by security guard");
        self.error(code, err.to_string())
    }
}

/// A typed guard error that maps to a security [`ErrorCode`].
pub trait GuardFailure {
    fn code(&self) -> ErrorCode;
}

impl GuardFailure for crate::security::RegexGuardError {
    fn code(&self) -> ErrorCode {
        Self::code(self)
    }
}

impl GuardFailure for crate::security::ObjectGuardError {
    fn code(&self) -> ErrorCode {
        Self::code(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::ObjectGuardError;

    #[test]
    fn test_paths_join_with_dots() {
        let ctx = ValidationContext::root()
            .child_key("user")
            .child_key("roles")
            .child_index(0);
        assert_eq!(ctx.path(), "user.roles.0");
        assert_eq!(ctx.depth(), 3);
    }

    #[test]
    fn test_at_key_keeps_depth() {
        let ctx = ValidationContext::root().child_index(2).at_key("value");
        assert_eq!(ctx.path(), "2.value");
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_custom_root_path() {
        let ctx = ValidationContext::at("body").child_key("id");
        assert_eq!(ctx.path(), "body.id");
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = ValidationContext::root()
            .child_key("age")
            .type_mismatch(ErrorCode::NotNumber, "number", &Value::from("x"));
        assert_eq!(err.path, "age");
        assert_eq!(err.message, "Expected number, received string");
        assert_eq!(err.expected.as_deref(), Some("number"));
    }

    #[test]
    fn test_violation_uses_guard_code() {
        let err = ValidationContext::root()
            .violation(&ObjectGuardError::DangerousKey { key: "__proto__" });
        assert_eq!(err.code, ErrorCode::SecurityDangerousKey);
        assert!(err.received.is_none());
    }
}
