//! BigInt schema

use crate::foundation::{ErrorCode, Validate, ValidationContext, ValidationError, ValidationResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BigIntCheck {
    Min(i128),
    Max(i128),
    Positive,
    Negative,
}

impl BigIntCheck {
    const fn holds(self, n: i128) -> bool {
        match self {
            Self::Min(min) => n >= min,
            Self::Max(max) => n <= max,
            Self::Positive => n > 0,
            Self::Negative => n < 0,
        }
    }

    fn error(self, ctx: &ValidationContext, n: i128) -> ValidationError {
        let error = match self {
            Self::Min(min) => ctx
                .error(
                    ErrorCode::BigIntTooSmall,
                    format!("BigInt must be greater than or equal to {min}n"),
                )
                .with_meta("minimum", Value::BigInt(min)),
            Self::Max(max) => ctx
                .error(
                    ErrorCode::BigIntTooBig,
                    format!("BigInt must be less than or equal to {max}n"),
                )
                .with_meta("maximum", Value::BigInt(max)),
            Self::Positive => ctx.error(ErrorCode::BigIntTooSmall, "BigInt must be positive"),
            Self::Negative => ctx.error(ErrorCode::BigIntTooBig, "BigInt must be negative"),
        };
        error.with_received(Value::BigInt(n))
    }
}

/// Accepts bigints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BigIntSchema {
    checks: Vec<BigIntCheck>,
}

/// A schema accepting any bigint.
#[must_use]
pub fn bigint() -> BigIntSchema {
    <BigIntSchema as Default>::default()
}

impl BigIntSchema {
    #[must_use = "builder methods must be chained or built"]
    pub fn min(mut self, min: i128) -> Self {
        self.checks.push(BigIntCheck::Min(min));
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn max(mut self, max: i128) -> Self {
        self.checks.push(BigIntCheck::Max(max));
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn positive(mut self) -> Self {
        self.checks.push(BigIntCheck::Positive);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn negative(mut self) -> Self {
        self.checks.push(BigIntCheck::Negative);
        self
    }

    fn first_failure(&self, n: i128) -> Option<BigIntCheck> {
        self.checks.iter().copied().find(|check| !check.holds(n))
    }
}

impl Validate for BigIntSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        let Value::BigInt(n) = value else {
            return Err(ctx.type_mismatch(ErrorCode::NotBigInt, "bigint", value).into());
        };
        match self.first_failure(*n) {
            None => Ok(value.clone()),
            Some(check) => Err(check.error(ctx, *n).into()),
        }
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        matches!(value, Value::BigInt(n) if self.first_failure(*n).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_check() {
        assert!(bigint().is(&Value::BigInt(1)));
        let err = bigint().validate(&Value::from(1)).unwrap_err();
        assert_eq!(err.first().code, ErrorCode::NotBigInt);
    }

    #[test]
    fn test_bounds() {
        let schema = bigint().min(10).max(20);
        assert!(schema.is(&Value::BigInt(15)));
        assert_eq!(
            schema.validate(&Value::BigInt(9)).unwrap_err().first().code,
            ErrorCode::BigIntTooSmall
        );
        assert_eq!(
            schema.validate(&Value::BigInt(21)).unwrap_err().first().code,
            ErrorCode::BigIntTooBig
        );
    }

    #[test]
    fn test_sign() {
        assert!(!bigint().positive().is(&Value::BigInt(0)));
        assert!(bigint().negative().is(&Value::BigInt(-5)));
    }
}
