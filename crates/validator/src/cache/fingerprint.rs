//! Cache keys derived from validated values.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Deserialize;

use crate::value::{Value, ValueKey};

/// How composite values (objects, arrays, maps, sets) are keyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// By allocation identity: the same shared value hits, an equal copy
    /// misses.
    #[default]
    Identity,
    /// By content: equal copies hit. Hashing walks the whole value, and a
    /// hit is confirmed with a deep comparison.
    Structural,
}

/// Primitives always key by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Fingerprint {
    Value(ValueKey),
    Content(u64),
}

impl Fingerprint {
    pub(crate) fn of(value: &Value, mode: FingerprintMode) -> Self {
        match mode {
            FingerprintMode::Structural if value.is_composite() => {
                let mut hasher = DefaultHasher::new();
                hash_content(value, &mut hasher);
                Self::Content(hasher.finish())
            }
            _ => Self::Value(value_key(value)),
        }
    }
}

/// Like [`Value::key`], except that `0.0` and `-0.0` key apart: a transform
/// may tell them apart, so their cached results can differ. NaN stays
/// canonical.
fn value_key(value: &Value) -> ValueKey {
    match value {
        Value::Number(n) if !n.is_nan() => ValueKey::Number(n.to_bits()),
        other => other.key(),
    }
}

fn hash_content<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Array(items) | Value::Set(items) => {
            items.len().hash(state);
            for item in items.iter() {
                hash_content(item, state);
            }
        }
        Value::Object(object) => {
            object.len().hash(state);
            for (key, item) in object.iter() {
                key.hash(state);
                hash_content(item, state);
            }
        }
        Value::Map(entries) => {
            entries.len().hash(state);
            for (key, item) in entries.iter() {
                hash_content(key, state);
                hash_content(item, state);
            }
        }
        primitive => value_key(primitive).hash(state),
    }
}

/// Deep equality matching [`hash_content`]: primitives by [`value_key`],
/// composites by content (object key order included).
pub(crate) fn same_content(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) | (Value::Set(x), Value::Set(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(x, y)| same_content(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|((kx, vx), (ky, vy))| kx == ky && same_content(vx, vy))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|((kx, vx), (ky, vy))| same_content(kx, ky) && same_content(vx, vy))
        }
        _ if a.is_composite() || b.is_composite() => false,
        _ => value_key(a) == value_key(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_mode_keys_composites_by_address() {
        let a = Value::from(json!({"x": 1}));
        let b = Value::from(json!({"x": 1}));
        assert_eq!(
            Fingerprint::of(&a, FingerprintMode::Identity),
            Fingerprint::of(&a.clone(), FingerprintMode::Identity)
        );
        assert_ne!(
            Fingerprint::of(&a, FingerprintMode::Identity),
            Fingerprint::of(&b, FingerprintMode::Identity)
        );
    }

    #[test]
    fn test_structural_mode_keys_composites_by_content() {
        let a = Value::from(json!({"x": [1, 2]}));
        let b = Value::from(json!({"x": [1, 2]}));
        let c = Value::from(json!({"x": [2, 1]}));
        assert_eq!(
            Fingerprint::of(&a, FingerprintMode::Structural),
            Fingerprint::of(&b, FingerprintMode::Structural)
        );
        assert_ne!(
            Fingerprint::of(&a, FingerprintMode::Structural),
            Fingerprint::of(&c, FingerprintMode::Structural)
        );
        assert!(same_content(&a, &b));
        assert!(!same_content(&a, &c));
    }

    #[test]
    fn test_primitives_key_by_value() {
        for mode in [FingerprintMode::Identity, FingerprintMode::Structural] {
            assert_eq!(
                Fingerprint::of(&Value::from(f64::NAN), mode),
                Fingerprint::of(&Value::from(-f64::NAN), mode)
            );
            assert_ne!(
                Fingerprint::of(&Value::from(1), mode),
                Fingerprint::of(&Value::from("1"), mode)
            );
            assert_ne!(
                Fingerprint::of(&Value::from(0.0), mode),
                Fingerprint::of(&Value::from(-0.0), mode)
            );
        }
    }

    #[test]
    fn test_signed_zeros_differ_inside_composites() {
        let positive = Value::from(vec![Value::from(0.0)]);
        let negative = Value::from(vec![Value::from(-0.0)]);
        assert_ne!(
            Fingerprint::of(&positive, FingerprintMode::Structural),
            Fingerprint::of(&negative, FingerprintMode::Structural)
        );
        assert!(!same_content(&positive, &negative));
        assert!(same_content(
            &Value::from(vec![Value::from(f64::NAN)]),
            &Value::from(vec![Value::from(f64::NAN)])
        ));
    }
}
