//! String schema
//!
//! Checks run in a fixed order regardless of the order they were
//! configured in: length constraints, then the user pattern, then
//! prefix/suffix/substring, then the built-in formats. The first failing
//! check is reported. Lengths are measured in Unicode scalar values.
//!
//! Transforms (`trim`, `to_lowercase`, `to_uppercase`) only shape the
//! output and run after every check has passed.

use std::borrow::Cow;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::foundation::{ErrorCode, Validate, ValidationContext, ValidationError, ValidationResult};
use crate::security::{GuardedRegex, RegexGuardError, SecurityLimits};
use crate::value::Value;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

// ============================================================================
// CHECKS
// ============================================================================

#[derive(Debug, Clone)]
enum StringCheck {
    Min(usize),
    Max(usize),
    Length(usize),
    NonEmpty,
    Regex(GuardedRegex),
    StartsWith(Arc<str>),
    EndsWith(Arc<str>),
    Includes(Arc<str>),
    Email,
    Url,
    Uuid,
    Datetime,
}

impl StringCheck {
    const fn rank(&self) -> u8 {
        match self {
            Self::Min(_) | Self::Max(_) | Self::Length(_) | Self::NonEmpty => 0,
            Self::Regex(_) => 1,
            Self::StartsWith(_) | Self::EndsWith(_) | Self::Includes(_) => 2,
            Self::Email | Self::Url | Self::Uuid | Self::Datetime => 3,
        }
    }

    /// Whether `input` passes; `len` yields its character count.
    fn holds(
        &self,
        input: &str,
        len: impl FnOnce() -> usize,
        limits: &SecurityLimits,
    ) -> Result<bool, RegexGuardError> {
        Ok(match self {
            Self::Min(n) => len() >= *n,
            Self::Max(n) => len() <= *n,
            Self::Length(n) => len() == *n,
            Self::NonEmpty => !input.is_empty(),
            Self::Regex(re) => return re.is_match(input, limits),
            Self::StartsWith(prefix) => input.starts_with(prefix.as_ref()),
            Self::EndsWith(suffix) => input.ends_with(suffix.as_ref()),
            Self::Includes(needle) => input.contains(needle.as_ref()),
            Self::Email => EMAIL_REGEX.is_match(input),
            Self::Url => url::Url::parse(input).is_ok(),
            Self::Uuid => UUID_REGEX.is_match(input),
            Self::Datetime => chrono::DateTime::parse_from_rfc3339(input).is_ok(),
        })
    }

    fn error(&self, ctx: &ValidationContext, input: &str) -> ValidationError {
        let received = || Value::from(input);
        match self {
            Self::Min(n) => ctx
                .error(
                    ErrorCode::StringTooShort,
                    format!("String must contain at least {n} character(s)"),
                )
                .with_meta("minimum", *n),
            Self::Max(n) => ctx
                .error(
                    ErrorCode::StringTooLong,
                    format!("String must contain at most {n} character(s)"),
                )
                .with_meta("maximum", *n),
            Self::Length(n) => ctx
                .error(
                    ErrorCode::StringInvalidLength,
                    format!("String must contain exactly {n} character(s)"),
                )
                .with_meta("length", *n),
            Self::NonEmpty => ctx.error(ErrorCode::StringTooShort, "String must not be empty"),
            Self::Regex(re) => ctx
                .error(
                    ErrorCode::StringPatternMismatch,
                    format!("String does not match pattern /{}/", re.as_str()),
                )
                .with_received(received()),
            Self::StartsWith(prefix) => ctx
                .error(
                    ErrorCode::StringInvalidPrefix,
                    format!("String must start with {prefix:?}"),
                )
                .with_received(received()),
            Self::EndsWith(suffix) => ctx
                .error(
                    ErrorCode::StringInvalidSuffix,
                    format!("String must end with {suffix:?}"),
                )
                .with_received(received()),
            Self::Includes(needle) => ctx
                .error(
                    ErrorCode::StringMissingSubstring,
                    format!("String must include {needle:?}"),
                )
                .with_received(received()),
            Self::Email => ctx
                .error(ErrorCode::InvalidEmail, "Invalid email address")
                .with_received(received()),
            Self::Url => ctx
                .error(ErrorCode::InvalidUrl, "Invalid URL")
                .with_received(received()),
            Self::Uuid => ctx
                .error(ErrorCode::InvalidUuid, "Invalid UUID")
                .with_received(received()),
            Self::Datetime => ctx
                .error(ErrorCode::InvalidDatetime, "Invalid ISO 8601 datetime")
                .with_received(received()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringTransform {
    Trim,
    Lowercase,
    Uppercase,
}

enum Failure<'a> {
    Check(&'a StringCheck),
    Guard(RegexGuardError),
}

// ============================================================================
// STRING SCHEMA
// ============================================================================

/// Accepts strings.
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    checks: Vec<StringCheck>,
    transforms: Vec<StringTransform>,
    limits: SecurityLimits,
}

/// A schema accepting any string.
#[must_use]
pub fn string() -> StringSchema {
    <StringSchema as Default>::default()
}

impl StringSchema {
    fn check(mut self, check: StringCheck) -> Self {
        self.checks.push(check);
        self.checks.sort_by_key(StringCheck::rank);
        self
    }

    fn transform(mut self, transform: StringTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// At least `n` characters.
    #[must_use = "builder methods must be chained or built"]
    pub fn min(self, n: usize) -> Self {
        self.check(StringCheck::Min(n))
    }

    /// At most `n` characters.
    #[must_use = "builder methods must be chained or built"]
    pub fn max(self, n: usize) -> Self {
        self.check(StringCheck::Max(n))
    }

    /// Exactly `n` characters.
    #[must_use = "builder methods must be chained or built"]
    pub fn length(self, n: usize) -> Self {
        self.check(StringCheck::Length(n))
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn nonempty(self) -> Self {
        self.check(StringCheck::NonEmpty)
    }

    /// Must match `pattern`, executed through the ReDoS guard.
    #[must_use = "builder methods must be chained or built"]
    pub fn regex(self, pattern: impl Into<GuardedRegex>) -> Self {
        self.check(StringCheck::Regex(pattern.into()))
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn starts_with(self, prefix: impl Into<Arc<str>>) -> Self {
        self.check(StringCheck::StartsWith(prefix.into()))
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn ends_with(self, suffix: impl Into<Arc<str>>) -> Self {
        self.check(StringCheck::EndsWith(suffix.into()))
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn includes(self, needle: impl Into<Arc<str>>) -> Self {
        self.check(StringCheck::Includes(needle.into()))
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn email(self) -> Self {
        self.check(StringCheck::Email)
    }

    /// An absolute URL, as accepted by the `url` crate.
    #[must_use = "builder methods must be chained or built"]
    pub fn url(self) -> Self {
        self.check(StringCheck::Url)
    }

    /// Hyphenated hexadecimal UUID of any version.
    #[must_use = "builder methods must be chained or built"]
    pub fn uuid(self) -> Self {
        self.check(StringCheck::Uuid)
    }

    /// RFC 3339 timestamp with offset.
    #[must_use = "builder methods must be chained or built"]
    pub fn datetime(self) -> Self {
        self.check(StringCheck::Datetime)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn trim(self) -> Self {
        self.transform(StringTransform::Trim)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn to_lowercase(self) -> Self {
        self.transform(StringTransform::Lowercase)
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn to_uppercase(self) -> Self {
        self.transform(StringTransform::Uppercase)
    }

    /// Limits applied to `regex` checks.
    #[must_use = "builder methods must be chained or built"]
    pub const fn regex_limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    fn first_failure(&self, input: &str) -> Option<Failure<'_>> {
        let mut chars = None;
        let mut len = || *chars.get_or_insert_with(|| input.chars().count());

        for check in &self.checks {
            match check.holds(input, &mut len, &self.limits) {
                Ok(true) => {}
                Ok(false) => return Some(Failure::Check(check)),
                Err(err) => return Some(Failure::Guard(err)),
            }
        }
        None
    }

    /// The checks folded for the compiled fast path.
    pub(crate) fn plan(&self) -> StringPlan {
        let mut plan = StringPlan {
            min_chars: 0,
            max_chars: usize::MAX,
            checks: Vec::new(),
            limits: self.limits,
        };
        for check in &self.checks {
            match *check {
                StringCheck::Min(n) => plan.min_chars = plan.min_chars.max(n),
                StringCheck::Max(n) => plan.max_chars = plan.max_chars.min(n),
                StringCheck::Length(n) => {
                    plan.min_chars = plan.min_chars.max(n);
                    plan.max_chars = plan.max_chars.min(n);
                }
                StringCheck::NonEmpty => plan.min_chars = plan.min_chars.max(1),
                ref other => plan.checks.push(other.clone()),
            }
        }
        plan
    }

    pub(crate) fn has_transforms(&self) -> bool {
        !self.transforms.is_empty()
    }

    pub(crate) fn output(&self, input: &Arc<str>) -> Value {
        if self.transforms.is_empty() {
            return Value::String(input.clone());
        }
        let mut out: Cow<'_, str> = Cow::Borrowed(input);
        for transform in &self.transforms {
            out = match transform {
                StringTransform::Trim => Cow::Owned(out.trim().to_owned()),
                StringTransform::Lowercase => Cow::Owned(out.to_lowercase()),
                StringTransform::Uppercase => Cow::Owned(out.to_uppercase()),
            };
        }
        Value::from(out.into_owned())
    }
}

/// Pass/fail form of a [`StringSchema`]: every length constraint folded
/// into one range over the character count, the other checks in order.
#[derive(Debug, Clone)]
pub(crate) struct StringPlan {
    min_chars: usize,
    max_chars: usize,
    checks: Vec<StringCheck>,
    limits: SecurityLimits,
}

impl StringPlan {
    pub(crate) fn accepts(&self, input: &str) -> bool {
        // a character is at least one byte long
        let bytes = input.len();
        if bytes < self.min_chars {
            return false;
        }
        if self.min_chars > 0 || bytes > self.max_chars {
            let chars = input.chars().count();
            if chars < self.min_chars || chars > self.max_chars {
                return false;
            }
        }
        self.checks.iter().all(|check| {
            check
                .holds(input, || input.chars().count(), &self.limits)
                .unwrap_or(false)
        })
    }
}

impl Validate for StringSchema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        let Value::String(input) = value else {
            return Err(ctx.type_mismatch(ErrorCode::NotString, "string", value).into());
        };
        match self.first_failure(input) {
            None => Ok(self.output(input)),
            Some(Failure::Check(check)) => Err(check.error(ctx, input).into()),
            Some(Failure::Guard(err)) => Err(ctx.violation(&err).into()),
        }
    }

    fn is_in(&self, value: &Value, _depth: usize) -> bool {
        matches!(value, Value::String(input) if self.first_failure(input).is_none())
    }
}
