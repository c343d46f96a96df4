//! The closed error-code taxonomy.
//!
//! Every [`ValidationError`](super::ValidationError) carries exactly one
//! [`ErrorCode`]. Codes serialize as `SCREAMING_SNAKE_CASE` strings and are
//! grouped into an [`ErrorCategory`] so callers can branch on the family
//! (for example to log security rejections separately) without matching
//! every code.

use std::fmt;

use serde::{Serialize, Serializer};

/// Family an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The runtime type of the value was wrong.
    TypeMismatch,
    /// The type was right but a constraint failed.
    Constraint,
    /// Object keys, unions, discriminators or intersections.
    Structural,
    /// A security guard rejected the input.
    Security,
    /// A user-supplied refinement or transform failed.
    UserCode,
}

macro_rules! error_codes {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, $category:ident; )+) => {
        /// Machine-readable validation failure code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum ErrorCode {
            $( $(#[$meta])* $variant, )+
        }

        impl ErrorCode {
            /// Every code, in declaration order.
            pub const ALL: &'static [ErrorCode] = &[$( ErrorCode::$variant, )+];

            /// Wire name of the code (`"NOT_STRING"`, ...).
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( ErrorCode::$variant => $name, )+
                }
            }

            /// Family of the code.
            #[must_use]
            pub const fn category(self) -> ErrorCategory {
                match self {
                    $( ErrorCode::$variant => ErrorCategory::$category, )+
                }
            }

            /// Looks a code up by its wire name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(ErrorCode::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

error_codes! {
    // Type mismatches
    NotString => "NOT_STRING", TypeMismatch;
    NotNumber => "NOT_NUMBER", TypeMismatch;
    NotBoolean => "NOT_BOOLEAN", TypeMismatch;
    NotBigInt => "NOT_BIGINT", TypeMismatch;
    NotSymbol => "NOT_SYMBOL", TypeMismatch;
    NotDate => "NOT_DATE", TypeMismatch;
    NotNull => "NOT_NULL", TypeMismatch;
    NotUndefined => "NOT_UNDEFINED", TypeMismatch;
    NotObject => "NOT_OBJECT", TypeMismatch;
    NotArray => "NOT_ARRAY", TypeMismatch;
    NotMap => "NOT_MAP", TypeMismatch;
    NotSet => "NOT_SET", TypeMismatch;
    /// Emitted by the `never` schema for every input.
    Never => "NEVER", TypeMismatch;

    // String constraints
    StringTooShort => "STRING_TOO_SHORT", Constraint;
    StringTooLong => "STRING_TOO_LONG", Constraint;
    StringInvalidLength => "STRING_INVALID_LENGTH", Constraint;
    StringPatternMismatch => "STRING_PATTERN_MISMATCH", Constraint;
    StringInvalidPrefix => "STRING_INVALID_PREFIX", Constraint;
    StringInvalidSuffix => "STRING_INVALID_SUFFIX", Constraint;
    StringMissingSubstring => "STRING_MISSING_SUBSTRING", Constraint;
    InvalidEmail => "INVALID_EMAIL", Constraint;
    InvalidUrl => "INVALID_URL", Constraint;
    InvalidUuid => "INVALID_UUID", Constraint;
    InvalidDatetime => "INVALID_DATETIME", Constraint;

    // Number constraints
    NumberTooSmall => "NUMBER_TOO_SMALL", Constraint;
    NumberTooBig => "NUMBER_TOO_BIG", Constraint;
    NumberNotInteger => "NUMBER_NOT_INTEGER", Constraint;
    NumberNotFinite => "NUMBER_NOT_FINITE", Constraint;
    NumberNotSafe => "NUMBER_NOT_SAFE", Constraint;
    NumberNotPositive => "NUMBER_NOT_POSITIVE", Constraint;
    NumberNotNegative => "NUMBER_NOT_NEGATIVE", Constraint;
    NumberNotMultiple => "NUMBER_NOT_MULTIPLE", Constraint;

    // Date constraints
    InvalidDate => "INVALID_DATE", Constraint;
    DateTooEarly => "DATE_TOO_EARLY", Constraint;
    DateTooLate => "DATE_TOO_LATE", Constraint;

    // BigInt constraints
    BigIntTooSmall => "BIGINT_TOO_SMALL", Constraint;
    BigIntTooBig => "BIGINT_TOO_BIG", Constraint;

    // Array and set constraints
    ArrayTooShort => "ARRAY_TOO_SHORT", Constraint;
    ArrayTooLong => "ARRAY_TOO_LONG", Constraint;
    ArrayInvalidLength => "ARRAY_INVALID_LENGTH", Constraint;
    ArrayNotUnique => "ARRAY_NOT_UNIQUE", Constraint;
    SetTooSmall => "SET_TOO_SMALL", Constraint;
    SetTooBig => "SET_TOO_BIG", Constraint;

    // Literals and enums
    InvalidLiteral => "INVALID_LITERAL", Constraint;
    InvalidEnumValue => "INVALID_ENUM_VALUE", Constraint;

    // Structure
    ObjectUnknownKey => "OBJECT_UNKNOWN_KEY", Structural;
    UnionNoMatch => "UNION_NO_MATCH", Structural;
    InvalidDiscriminator => "INVALID_DISCRIMINATOR", Structural;
    IntersectionConflict => "INTERSECTION_CONFLICT", Structural;

    // Security guards
    SecurityDangerousKey => "SECURITY_DANGEROUS_KEY", Security;
    SecurityMaxDepth => "SECURITY_MAX_DEPTH", Security;
    SecurityInputTooLong => "SECURITY_INPUT_TOO_LONG", Security;
    SecurityUnsafePattern => "SECURITY_UNSAFE_PATTERN", Security;
    SecurityRegexTimeout => "SECURITY_REGEX_TIMEOUT", Security;

    // User code
    RefinementFailed => "REFINEMENT_FAILED", UserCode;
    TransformFailed => "TRANSFORM_FAILED", UserCode;
    /// Issue pushed by a `super_refine` refiner.
    Custom => "CUSTOM", UserCode;
}

impl ErrorCode {
    /// `true` for codes produced by the security guards.
    #[must_use]
    pub const fn is_security(self) -> bool {
        matches!(self.category(), ErrorCategory::Security)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
