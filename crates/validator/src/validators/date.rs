//! Date schema

use chrono::{DateTime, SecondsFormat, Utc};

use crate::foundation::{ErrorCode, Validate, ValidationContext, ValidationError, ValidationResult};
use crate::value::Value;

/// Accepts valid dates, optionally within bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateSchema {
    min: Option<DateTime<Utc>>,
    max: Option<DateTime<Utc>>,
}

/// A schema accepting any valid date.
#[must_use]
pub fn date() -> DateSchema {
    <DateSchema as Default>::default()
}

impl DateSchema {
    /// Not earlier than `min`.
    #[must_use = "builder methods must be chained or built"]
    pub const fn min(mut self, min: DateTime<Utc>) -> Self {
        self.min = Some(min);
        self
    }

    /// Not later than `max`.
    #[must_use = "builder methods must be chained or built"]
    pub const fn max(mut self, max: DateTime<Utc>) -> Self {
        self.max = Some(max);
        self
    }

    fn failure(&self, value: &Value, ctx: &ValidationContext) -> Option<ValidationError> {
        let date = match value {
            Value::Date(Some(date)) => *date,
            Value::Date(None) => {
                return Some(ctx.error(ErrorCode::InvalidDate, "Invalid date"));
            }
            other => return Some(ctx.type_mismatch(ErrorCode::NotDate, "date", other)),
        };
        if let Some(min) = self.min.filter(|min| date < *min) {
            return Some(
                ctx.error(
                    ErrorCode::DateTooEarly,
                    format!(
                        "Date must be on or after {}",
                        min.to_rfc3339_opts(SecondsFormat::Millis, true)
                    ),
                )
                .with_meta("minimum", min)
                .with_received(value.clone()),
            );
        }
        if let Some(max) = self.max.filter(|max| date > *max) {
            return Some(
                ctx.error(
                    ErrorCode::DateTooLate,
                    format!(
                        "Date must be on or before {}",
                        max.to_rfc3339_opts(SecondsFormat::Millis, true)
                    ),
                )
                .with_meta("maximum", max)
                .with_received(value.clone()),
            );
        }
        None
    }
}

impl Validate for DateSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        match self.failure(value, ctx) {
            None => Ok(value.clone()),
            Some(error) => Err(error.into()),
        }
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        match value {
            Value::Date(Some(date)) => {
                self.min.is_none_or(|min| *date >= min) && self.max.is_none_or(|max| *date <= max)
            }
            _ => false,
        }
    }
}
