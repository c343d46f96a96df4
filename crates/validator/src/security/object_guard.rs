//! Prototype-pollution and nesting-depth guard.
//!
//! Objects are checked before their fields are validated: an own key that
//! can rewrite a prototype chain when the data is later merged into a host
//! object is rejected outright, and containers nested deeper than
//! [`SecurityLimits::max_depth`] are refused so recursive schemas cannot be
//! driven into unbounded work.

use super::SecurityLimits;
use crate::foundation::{ErrorCode, ValidationContext, ValidationError};
use crate::value::{Object, Value};

/// Own-property names rejected on every object.
pub const DANGEROUS_KEYS: &[&str] = &[
    "__proto__",
    "constructor",
    "prototype",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectGuardError {
    #[error("object carries the forbidden key \"{key}\"")]
    DangerousKey { key: &'static str },

    #[error("nesting depth {depth} exceeds the limit of {max}")]
    TooDeep { depth: usize, max: usize },
}

impl ObjectGuardError {
    /// Validation code reported for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DangerousKey { .. } => ErrorCode::SecurityDangerousKey,
            Self::TooDeep { .. } => ErrorCode::SecurityMaxDepth,
        }
    }
}

/// Canonical name if `key` is one of [`DANGEROUS_KEYS`].
#[must_use]
pub fn dangerous_key(key: &str) -> Option<&'static str> {
    DANGEROUS_KEYS.iter().copied().find(|k| *k == key)
}

/// Fails when a container at `depth` is nested too deeply.
///
/// # Errors
///
/// [`ObjectGuardError::TooDeep`] when `depth > limits.max_depth`.
pub const fn check_depth(depth: usize, limits: &SecurityLimits) -> Result<(), ObjectGuardError> {
    if depth > limits.max_depth {
        Err(ObjectGuardError::TooDeep {
            depth,
            max: limits.max_depth,
        })
    } else {
        Ok(())
    }
}

/// Fails on the first dangerous own key of `object`.
///
/// # Errors
///
/// [`ObjectGuardError::DangerousKey`] naming the offending key.
pub fn check_keys(object: &Object) -> Result<(), ObjectGuardError> {
    match object.keys().find_map(|k| dangerous_key(k)) {
        Some(key) => Err(ObjectGuardError::DangerousKey { key }),
        None => Ok(()),
    }
}

/// Depth check followed by the key check.
///
/// # Errors
///
/// See [`check_depth`] and [`check_keys`].
pub fn check_object(
    object: &Object,
    depth: usize,
    limits: &SecurityLimits,
) -> Result<(), ObjectGuardError> {
    check_depth(depth, limits)?;
    check_keys(object)
}

/// Recursively guards a value that is copied into the output without a
/// schema (passthrough keys).
pub(crate) fn scan(
    value: &Value,
    ctx: &ValidationContext,
    limits: &SecurityLimits,
) -> Result<(), ValidationError> {
    match value {
        Value::Object(map) => {
            check_object(map, ctx.depth(), limits).map_err(|e| ctx.violation(&e))?;
            for (key, child) in map.iter() {
                scan(child, &ctx.child_key(key), limits)?;
            }
            Ok(())
        }
        Value::Array(items) | Value::Set(items) => {
            check_depth(ctx.depth(), limits).map_err(|e| ctx.violation(&e))?;
            for (i, child) in items.iter().enumerate() {
                scan(child, &ctx.child_index(i), limits)?;
            }
            Ok(())
        }
        Value::Map(entries) => {
            check_depth(ctx.depth(), limits).map_err(|e| ctx.violation(&e))?;
            for (i, (k, v)) in entries.iter().enumerate() {
                let entry = ctx.child_index(i);
                scan(k, &entry.at_key("key"), limits)?;
                scan(v, &entry.at_key("value"), limits)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `true` when [`scan`] would pass.
pub(crate) fn scan_ok(value: &Value, depth: usize, limits: &SecurityLimits) -> bool {
    match value {
        Value::Object(map) => {
            check_object(map, depth, limits).is_ok()
                && map.values().all(|v| scan_ok(v, depth + 1, limits))
        }
        Value::Array(items) | Value::Set(items) => {
            check_depth(depth, limits).is_ok()
                && items.iter().all(|v| scan_ok(v, depth + 1, limits))
        }
        Value::Map(entries) => {
            check_depth(depth, limits).is_ok()
                && entries
                    .iter()
                    .all(|(k, v)| scan_ok(k, depth + 1, limits) && scan_ok(v, depth + 1, limits))
        }
        _ => true,
    }
}
