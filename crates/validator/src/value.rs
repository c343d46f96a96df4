//! Dynamic runtime values.
//!
//! Schemas validate [`Value`]s: the untrusted, dynamically typed data that
//! arrives from JSON bodies, form posts, RPC payloads and similar sources.
//! The variants mirror the distinctions the schema algebra draws
//! (`undefined` vs `null`, `number` vs `bigint`, plain objects vs maps).
//!
//! Composite variants are reference counted, so cloning a value is cheap and
//! two clones of the same array or object are *identical* in the sense of
//! [`Value::ptr_eq`]. The validation cache fingerprints composites by that
//! identity.
//!
//! ```rust,ignore
//! use warden_validator::Value;
//! use serde_json::json;
//!
//! let v = Value::from(json!({ "name": "alice", "tags": ["a", "b"] }));
//! assert_eq!(v.get("name"), Some(&Value::from("alice")));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Insertion-ordered string-keyed map backing [`Value::Object`].
pub type Object = IndexMap<String, Value>;

/// Shared `undefined`, used when a declared field is absent from the input.
pub(crate) static UNDEFINED: Value = Value::Undefined;

/// A dynamically typed runtime value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Undefined,
    /// Explicit `null`.
    Null,
    Bool(bool),
    /// IEEE-754 double; may be NaN or infinite.
    Number(f64),
    /// Arbitrary-sign integer outside the `number` domain.
    BigInt(i128),
    String(Arc<str>),
    Symbol(Symbol),
    /// Timestamp; `None` is an unparseable ("invalid") date.
    Date(Option<DateTime<Utc>>),
    Array(Arc<Vec<Value>>),
    Object(Arc<Object>),
    /// Ordered key/value pairs with arbitrary keys.
    Map(Arc<Vec<(Value, Value)>>),
    Set(Arc<Vec<Value>>),
}

impl Value {
    /// Builds an object from key/value pairs, keeping their order.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Object(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Builds an array.
    pub fn array<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::Array(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Builds a map from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Builds a set. Duplicates (by SameValueZero) are dropped.
    pub fn set<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.iter().any(|existing| existing.same_value_zero(&item)) {
                out.push(item);
            }
        }
        Self::Set(Arc::new(out))
    }

    /// A date value that failed to parse.
    #[must_use]
    pub const fn invalid_date() -> Self {
        Self::Date(None)
    }

    /// Runtime type name used in error messages (`"string"`, `"array"`, ...).
    ///
    /// NaN reports as `"nan"` so that "expected number, received nan" reads
    /// correctly.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(n) if n.is_nan() => "nan",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
        }
    }

    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up an object field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// `true` for variants compared by identity rather than content
    /// (arrays, objects, maps, sets).
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Array(_) | Self::Object(_) | Self::Map(_) | Self::Set(_)
        )
    }

    /// Identity comparison: composites are identical only when they share
    /// the same allocation; primitives fall back to [`Value::same_value_zero`].
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) | (Self::Set(a), Self::Set(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            _ if self.is_composite() || other.is_composite() => false,
            _ => self.same_value_zero(other),
        }
    }

    /// SameValueZero equality: primitives by value (NaN equals NaN, `-0`
    /// equals `0`), composites by identity.
    #[must_use]
    pub fn same_value_zero(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            _ if self.is_composite() => self.ptr_eq(other),
            _ => false,
        }
    }

    /// Hashable SameValueZero key: equal keys mean
    /// [`Value::same_value_zero`] holds. Composites key by address, so the
    /// key is only meaningful while the value is alive.
    pub(crate) fn key(&self) -> ValueKey {
        match self {
            Self::Undefined => ValueKey::Undefined,
            Self::Null => ValueKey::Null,
            Self::Bool(b) => ValueKey::Bool(*b),
            Self::Number(n) if n.is_nan() => ValueKey::Number(f64::NAN.to_bits()),
            Self::Number(n) if *n == 0.0 => ValueKey::Number(0.0_f64.to_bits()),
            Self::Number(n) => ValueKey::Number(n.to_bits()),
            Self::BigInt(n) => ValueKey::BigInt(*n),
            Self::String(s) => ValueKey::String(s.clone()),
            Self::Symbol(s) => ValueKey::Symbol(s.id()),
            Self::Date(d) => ValueKey::Date(d.map(|d| (d.timestamp(), d.timestamp_subsec_nanos()))),
            Self::Array(_) | Self::Object(_) | Self::Map(_) | Self::Set(_) => {
                ValueKey::Ref(self.identity().unwrap_or_default())
            }
        }
    }

    /// Address of the shared allocation for composites.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Self::Array(a) | Self::Set(a) => Some(Arc::as_ptr(a).cast::<()>() as usize),
            Self::Object(o) => Some(Arc::as_ptr(o).cast::<()>() as usize),
            Self::Map(m) => Some(Arc::as_ptr(m).cast::<()>() as usize),
            _ => None,
        }
    }
}

/// Structural equality. Numbers compare with IEEE semantics, so a value
/// holding NaN is not equal to itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Array(a), Self::Array(b)) | (Self::Set(a), Self::Set(b)) => {
                Arc::ptr_eq(a, b) || a == b
            }
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) if n.is_nan() => f.write_str("NaN"),
            Self::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Number(n) => write!(f, "{n}"),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => write!(f, "{s}"),
            Self::Date(Some(d)) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Date(None) => f.write_str("Invalid Date"),
            Self::Array(items) => write!(f, "Array({})", items.len()),
            Self::Object(_) => f.write_str("Object"),
            Self::Map(entries) => write!(f, "Map({})", entries.len()),
            Self::Set(items) => write!(f, "Set({})", items.len()),
        }
    }
}

/// See [`Value::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Undefined,
    Null,
    Bool(bool),
    Number(u64),
    BigInt(i128),
    String(Arc<str>),
    Symbol(u64),
    Date(Option<(i64, u32)>),
    Ref(usize),
}

// ============================================================================
// SYMBOL
// ============================================================================

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A unique, optionally described token. Two symbols are equal only if one
/// is a clone of the other.
#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    /// Creates a fresh symbol with a description.
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: Some(description.into()),
        }
    }

    /// Creates a fresh symbol without a description.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

// ============================================================================
// SERIALIZATION
// ============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null | Self::Date(None) => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::BigInt(n) => serializer.collect_str(n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Symbol(s) => serializer.collect_str(s),
            Self::Date(Some(d)) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Self::Array(items) | Self::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Self::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for (k, v) in entries.iter() {
                    seq.serialize_element(&(k, v))?;
                }
                seq.end()
            }
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s.into()),
            serde_json::Value::Array(items) => {
                Self::Array(Arc::new(items.into_iter().map(Self::from).collect()))
            }
            serde_json::Value::Object(map) => Self::Object(Arc::new(
                map.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        serde_json::to_value(value).unwrap_or(Self::Null)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Self::BigInt(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Self::Symbol(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(Some(d))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(items))
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Self::Object(Arc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Undefined, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_converts_from_json() {
        let v = Value::from(json!({"a": [1, "x", null], "b": true}));
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(v.get("b"), Some(&Value::Bool(true)));
        assert_eq!(v.get("a").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_structural_equality_ignores_identity() {
        let a = Value::from(json!({"x": [1, 2]}));
        let b = Value::from(json!({"x": [1, 2]}));
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn test_same_value_zero_treats_nan_as_equal() {
        let nan = Value::Number(f64::NAN);
        assert!(nan.same_value_zero(&Value::Number(f64::NAN)));
        assert_ne!(nan, Value::Number(f64::NAN));
        assert!(Value::Number(0.0).same_value_zero(&Value::Number(-0.0)));
    }

    #[test]
    fn test_symbols_are_unique() {
        let a = Symbol::new("tag");
        let b = Symbol::new("tag");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.to_string(), "Symbol(tag)");
    }

    #[test]
    fn test_set_drops_duplicates() {
        let s = Value::set([1, 2, 1]);
        match s {
            Value::Set(items) => assert_eq!(items.len(), 2),
            other => panic!("expected set, got {other:?}"),
        }
    }

    #[test]
    fn test_serializes_like_json() {
        let v = Value::object([
            ("n", Value::from(1.5)),
            ("big", Value::BigInt(12)),
            ("u", Value::Undefined),
        ]);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, json!({"n": 1.5, "big": "12", "u": null}));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Number(f64::NAN).type_name(), "nan");
        assert_eq!(Value::from(vec![]).type_name(), "array");
        assert_eq!(Value::invalid_date().type_name(), "date");
    }
}
