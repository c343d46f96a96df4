//! Number schema
//!
//! NaN is never a number. Constraints run in a fixed order (finite, int,
//! safe, lower bound, upper bound, sign, multiple) and the first failure is
//! reported.

use crate::foundation::{ErrorCode, Validate, ValidationContext, ValidationError, ValidationResult};
use crate::value::Value;

/// Largest integer exactly representable in an `f64` (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NumberCheck {
    Finite,
    Int,
    Safe,
    Min { value: f64, inclusive: bool },
    Max { value: f64, inclusive: bool },
    Positive,
    Negative,
    MultipleOf(f64),
}

impl NumberCheck {
    const fn rank(&self) -> u8 {
        match self {
            Self::Finite => 0,
            Self::Int => 1,
            Self::Safe => 2,
            Self::Min { .. } => 3,
            Self::Max { .. } => 4,
            Self::Positive | Self::Negative => 5,
            Self::MultipleOf(_) => 6,
        }
    }

    fn holds(&self, n: f64) -> bool {
        match *self {
            Self::Finite => n.is_finite(),
            Self::Int => n.is_finite() && n.fract() == 0.0,
            Self::Safe => (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n),
            Self::Min { value, inclusive } => {
                if inclusive {
                    n >= value
                } else {
                    n > value
                }
            }
            Self::Max { value, inclusive } => {
                if inclusive {
                    n <= value
                } else {
                    n < value
                }
            }
            Self::Positive => n > 0.0,
            Self::Negative => n < 0.0,
            Self::MultipleOf(step) => is_multiple(n, step),
        }
    }

    fn error(&self, ctx: &ValidationContext, n: f64) -> ValidationError {
        let error = match *self {
            Self::Finite => ctx.error(ErrorCode::NumberNotFinite, "Number must be finite"),
            Self::Int => ctx.error(ErrorCode::NumberNotInteger, "Expected integer, received float"),
            Self::Safe => ctx.error(
                ErrorCode::NumberNotSafe,
                "Number must be a safe integer magnitude",
            ),
            Self::Min { value, inclusive } => ctx
                .error(
                    ErrorCode::NumberTooSmall,
                    if inclusive {
                        format!("Number must be greater than or equal to {}", Value::Number(value))
                    } else {
                        format!("Number must be greater than {}", Value::Number(value))
                    },
                )
                .with_meta("minimum", value)
                .with_meta("inclusive", inclusive),
            Self::Max { value, inclusive } => ctx
                .error(
                    ErrorCode::NumberTooBig,
                    if inclusive {
                        format!("Number must be less than or equal to {}", Value::Number(value))
                    } else {
                        format!("Number must be less than {}", Value::Number(value))
                    },
                )
                .with_meta("maximum", value)
                .with_meta("inclusive", inclusive),
            Self::Positive => ctx.error(ErrorCode::NumberNotPositive, "Number must be positive"),
            Self::Negative => ctx.error(ErrorCode::NumberNotNegative, "Number must be negative"),
            Self::MultipleOf(step) => ctx
                .error(
                    ErrorCode::NumberNotMultiple,
                    format!("Number must be a multiple of {}", Value::Number(step)),
                )
                .with_meta("multiple_of", step),
        };
        error.with_received(Value::Number(n))
    }
}

/// `n / step` is an integer up to a tolerance relative to the quotient, so
/// `0.3` is a multiple of `0.1`.
fn is_multiple(n: f64, step: f64) -> bool {
    if step == 0.0 || !step.is_finite() || !n.is_finite() {
        return false;
    }
    let ratio = n / step;
    (ratio - ratio.round()).abs() <= f64::EPSILON * 16.0 * ratio.abs().max(1.0)
}

/// Accepts numbers other than NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberSchema {
    checks: Vec<NumberCheck>,
}

/// A schema accepting any number except NaN.
#[must_use]
pub fn number() -> NumberSchema {
    <NumberSchema as Default>::default()
}

impl NumberSchema {
    fn check(mut self, check: NumberCheck) -> Self {
        self.checks.push(check);
        self.checks.sort_by_key(NumberCheck::rank);
        self
    }

    /// Rejects infinities.
    #[must_use = "builder methods must be chained or built"]
    pub fn finite(self) -> Self {
        self.check(NumberCheck::Finite)
    }

    /// Integers only.
    #[must_use = "builder methods must be chained or built"]
    pub fn int(self) -> Self {
        self.check(NumberCheck::Int)
    }

    /// Magnitude at most [`MAX_SAFE_INTEGER`].
    #[must_use = "builder methods must be chained or built"]
    pub fn safe(self) -> Self {
        self.check(NumberCheck::Safe)
    }

    /// `>= value`.
    #[must_use = "builder methods must be chained or built"]
    pub fn min(self, value: f64) -> Self {
        self.check(NumberCheck::Min {
            value,
            inclusive: true,
        })
    }

    /// Alias of [`min`](Self::min).
    #[must_use = "builder methods must be chained or built"]
    pub fn gte(self, value: f64) -> Self {
        self.min(value)
    }

    /// `> value`.
    #[must_use = "builder methods must be chained or built"]
    pub fn gt(self, value: f64) -> Self {
        self.check(NumberCheck::Min {
            value,
            inclusive: false,
        })
    }

    /// `<= value`.
    #[must_use = "builder methods must be chained or built"]
    pub fn max(self, value: f64) -> Self {
        self.check(NumberCheck::Max {
            value,
            inclusive: true,
        })
    }

    /// Alias of [`max`](Self::max).
    #[must_use = "builder methods must be chained or built"]
    pub fn lte(self, value: f64) -> Self {
        self.max(value)
    }

    /// `< value`.
    #[must_use = "builder methods must be chained or built"]
    pub fn lt(self, value: f64) -> Self {
        self.check(NumberCheck::Max {
            value,
            inclusive: false,
        })
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn positive(self) -> Self {
        self.check(NumberCheck::Positive)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn negative(self) -> Self {
        self.check(NumberCheck::Negative)
    }

    /// `>= 0`.
    #[must_use = "builder methods must be chained or built"]
    pub fn nonnegative(self) -> Self {
        self.min(0.0)
    }

    /// `<= 0`.
    #[must_use = "builder methods must be chained or built"]
    pub fn nonpositive(self) -> Self {
        self.max(0.0)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn multiple_of(self, step: f64) -> Self {
        self.check(NumberCheck::MultipleOf(step))
    }

    fn first_failure(&self, n: f64) -> Option<&NumberCheck> {
        self.checks.iter().find(|check| !check.holds(n))
    }

    /// The checks folded for the compiled fast path.
    pub(crate) fn plan(&self) -> NumberPlan {
        let mut plan = NumberPlan {
            lower: (f64::NEG_INFINITY, true),
            upper: (f64::INFINITY, true),
            finite: false,
            int: false,
            multiples: Vec::new(),
            unsatisfiable: false,
        };
        for check in &self.checks {
            match *check {
                NumberCheck::Finite => plan.finite = true,
                NumberCheck::Int => {
                    plan.finite = true;
                    plan.int = true;
                }
                NumberCheck::Safe => {
                    plan.raise(-MAX_SAFE_INTEGER, true);
                    plan.lower_to(MAX_SAFE_INTEGER, true);
                }
                NumberCheck::Min { value, inclusive } => plan.raise(value, inclusive),
                NumberCheck::Max { value, inclusive } => plan.lower_to(value, inclusive),
                NumberCheck::Positive => plan.raise(0.0, false),
                NumberCheck::Negative => plan.lower_to(0.0, false),
                NumberCheck::MultipleOf(step) => plan.multiples.push(step),
            }
        }
        plan
    }
}

/// Pass/fail form of a [`NumberSchema`]: bounds folded into one interval.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NumberPlan {
    lower: (f64, bool),
    upper: (f64, bool),
    finite: bool,
    int: bool,
    multiples: Vec<f64>,
    unsatisfiable: bool,
}

impl NumberPlan {
    fn raise(&mut self, value: f64, inclusive: bool) {
        if value.is_nan() {
            self.unsatisfiable = true;
        } else if value > self.lower.0 {
            self.lower = (value, inclusive);
        } else if value == self.lower.0 {
            self.lower.1 &= inclusive;
        }
    }

    fn lower_to(&mut self, value: f64, inclusive: bool) {
        if value.is_nan() {
            self.unsatisfiable = true;
        } else if value < self.upper.0 {
            self.upper = (value, inclusive);
        } else if value == self.upper.0 {
            self.upper.1 &= inclusive;
        }
    }

    pub(crate) fn accepts(&self, n: f64) -> bool {
        let (low, low_inclusive) = self.lower;
        let (high, high_inclusive) = self.upper;
        !n.is_nan()
            && !self.unsatisfiable
            && (!self.finite || n.is_finite())
            && (!self.int || n.fract() == 0.0)
            && (n > low || (low_inclusive && n == low))
            && (n < high || (high_inclusive && n == high))
            && self.multiples.iter().all(|step| is_multiple(n, *step))
    }
}

impl Validate for NumberSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        match value {
            Value::Number(n) if !n.is_nan() => match self.first_failure(*n) {
                None => Ok(value.clone()),
                Some(check) => Err(check.error(ctx, *n).into()),
            },
            _ => Err(ctx.type_mismatch(ErrorCode::NotNumber, "number", value).into()),
        }
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        matches!(value, Value::Number(n) if !n.is_nan() && self.first_failure(*n).is_none())
    }
}
