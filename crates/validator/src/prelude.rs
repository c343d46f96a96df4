//! Prelude module for convenient imports.
//!
//! `use warden_validator::prelude::*;` brings in the `Validate` trait, the
//! chainable modifiers, every schema factory and the compiler and cache
//! entry points.

// ============================================================================
// FOUNDATION: Core trait, values, errors
// ============================================================================

pub use crate::foundation::{
    ErrorCategory, ErrorCode, SchemaError, Validate, ValidationContext, ValidationError,
    ValidationErrors, ValidationResult,
};
pub use crate::schema::{Schema, SchemaKind};
pub use crate::value::{Object, Symbol, Value};

// ============================================================================
// VALIDATORS: All built-in schemas
// ============================================================================

#[allow(clippy::wildcard_imports)]
pub use crate::validators::*;

// ============================================================================
// COMBINATORS: Modifiers and lazy schemas
// ============================================================================

pub use crate::combinators::{
    BoxError, LazySchema, ModifiedSchema, Modifier, RefinementContext, SchemaExt, lazy,
};

// ============================================================================
// COMPILER, CACHE, SECURITY
// ============================================================================

pub use crate::cache::{CacheConfig, CachePolicy, CacheStats, FingerprintMode, ValidationCache};
pub use crate::compiler::{CompileStats, CompiledValidator, compile};
pub use crate::security::{GuardedRegex, SecurityLimits};

pub use crate::object;
