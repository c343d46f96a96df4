//! Exact-type and catch-all schemas: boolean, symbol, null, undefined, any,
//! unknown, never, void.

use crate::foundation::{ErrorCode, Validate, ValidationContext, ValidationResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Symbol,
    Null,
    Undefined,
    /// Accepts everything.
    Any,
    /// Accepts everything.
    Unknown,
    /// Accepts nothing.
    Never,
    /// Accepts only `undefined`.
    Void,
}

impl PrimitiveKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Symbol => "symbol",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Never => "never",
            Self::Void => "void",
        }
    }

    const fn code(self) -> ErrorCode {
        match self {
            Self::Boolean => ErrorCode::NotBoolean,
            Self::Symbol => ErrorCode::NotSymbol,
            Self::Null => ErrorCode::NotNull,
            Self::Undefined | Self::Void => ErrorCode::NotUndefined,
            Self::Any | Self::Unknown | Self::Never => ErrorCode::Never,
        }
    }

    const fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Boolean => matches!(value, Value::Bool(_)),
            Self::Symbol => matches!(value, Value::Symbol(_)),
            Self::Null => matches!(value, Value::Null),
            Self::Undefined | Self::Void => matches!(value, Value::Undefined),
            Self::Any | Self::Unknown => true,
            Self::Never => false,
        }
    }
}

/// Schema for one of the [`PrimitiveKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveSchema {
    kind: PrimitiveKind,
}

impl PrimitiveSchema {
    #[must_use]
    pub const fn new(kind: PrimitiveKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub const fn kind(&self) -> PrimitiveKind {
        self.kind
    }
}

#[must_use]
pub const fn boolean() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Boolean)
}

#[must_use]
pub const fn symbol() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Symbol)
}

#[must_use]
pub const fn null() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Null)
}

#[must_use]
pub const fn undefined() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Undefined)
}

#[must_use]
pub const fn any() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Any)
}

#[must_use]
pub const fn unknown() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Unknown)
}

#[must_use]
pub const fn never() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Never)
}

#[must_use]
pub const fn void() -> PrimitiveSchema {
    PrimitiveSchema::new(PrimitiveKind::Void)
}

impl Validate for PrimitiveSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        if self.kind.accepts(value) {
            Ok(value.clone())
        } else {
            Err(ctx
                .type_mismatch(self.kind.code(), self.kind.name(), value)
                .into())
        }
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        self.kind.accepts(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Symbol;
    use rstest::rstest;

    #[rstest]
    #[case(boolean(), Value::Bool(false), true)]
    #[case(boolean(), Value::from(0), false)]
    #[case(symbol(), Value::from(Symbol::new("s")), true)]
    #[case(null(), Value::Null, true)]
    #[case(null(), Value::Undefined, false)]
    #[case(undefined(), Value::Undefined, true)]
    #[case(undefined(), Value::Null, false)]
    #[case(void(), Value::Undefined, true)]
    #[case(void(), Value::from(""), false)]
    #[case(any(), Value::Null, true)]
    #[case(unknown(), Value::from(vec![]), true)]
    #[case(never(), Value::Undefined, false)]
    fn test_accepts(#[case] schema: PrimitiveSchema, #[case] value: Value, #[case] ok: bool) {
        assert_eq!(schema.is(&value), ok);
        assert_eq!(schema.validate(&value).is_ok(), ok);
    }

    #[test]
    fn test_codes() {
        let err = boolean().validate(&Value::from("true")).unwrap_err();
        assert_eq!(err.first().code, ErrorCode::NotBoolean);
        let err = never().validate(&Value::Null).unwrap_err();
        assert_eq!(err.first().code, ErrorCode::Never);
        assert_eq!(err.first().message, "Expected never, received null");
    }
}
