//! Validation result cache
//!
//! Memoizes validation results per `(schema id, value)`. The schema id is
//! chosen by the caller; a result is never returned for a different id.
//! Values are keyed by [`FingerprintMode`]: primitives always by value,
//! composites by identity or by content.
//!
//! Every entry keeps its value alive, so an identity key can never be
//! matched by an unrelated value that happens to reuse a freed address.
//!
//! ```rust,ignore
//! use warden_validator::prelude::*;
//!
//! let cache = ValidationCache::new(CacheConfig::default());
//! let schema = string().email();
//! let input = Value::from("a@b.co");
//!
//! let first = cache.get_or_validate(&input, "email", &schema);
//! let second = cache.get_or_validate(&input, "email", &schema);
//! assert_eq!(cache.stats().hits, 1);
//! ```

mod fingerprint;

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, trace};

pub use fingerprint::FingerprintMode;

use crate::foundation::{Validate, ValidationResult};
use crate::value::Value;
use fingerprint::{Fingerprint, same_content};

/// Default entry bound.
pub const DEFAULT_MAX_SIZE: usize = 1_000;

/// Time to live used by [`CachePolicy::Ttl`] when no `ttl_ms` is set.
pub const DEFAULT_TTL_MS: u64 = 60_000;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Primary eviction strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Drop the least recently used entry once `max_size` is reached.
    #[default]
    Lru,
    /// Expire entries after the time to live. `max_size` still bounds the
    /// cache, evicting by recency.
    Ttl,
}

/// Cache configuration.
///
/// Deserializable so hosts can load it from their own config files:
///
/// ```toml
/// policy = "ttl"
/// max_size = 10000
/// ttl_ms = 30000
/// fingerprint = "structural"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub policy: CachePolicy,
    /// Entry bound; `None` for unbounded. `0` behaves as `1`.
    pub max_size: Option<usize>,
    /// Time to live in milliseconds. Applies under either policy when set.
    pub ttl_ms: Option<u64>,
    pub fingerprint: FingerprintMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::Lru,
            max_size: Some(DEFAULT_MAX_SIZE),
            ttl_ms: None,
            fingerprint: FingerprintMode::Identity,
        }
    }
}

impl CacheConfig {
    /// An LRU cache holding at most `max_size` entries.
    #[must_use]
    pub fn lru(max_size: usize) -> Self {
        Self {
            max_size: Some(max_size),
            ..Self::default()
        }
    }

    /// A TTL cache.
    #[must_use]
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            policy: CachePolicy::Ttl,
            ttl_ms: Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
            ..Self::default()
        }
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_max_size(mut self, max_size: Option<usize>) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_fingerprint(mut self, mode: FingerprintMode) -> Self {
        self.fingerprint = mode;
        self
    }

    /// Effective time to live.
    #[must_use]
    pub fn time_to_live(&self) -> Option<Duration> {
        match (self.policy, self.ttl_ms) {
            (_, Some(ms)) => Some(Duration::from_millis(ms)),
            (CachePolicy::Ttl, None) => Some(Duration::from_millis(DEFAULT_TTL_MS)),
            (CachePolicy::Lru, None) => None,
        }
    }
}

// ============================================================================
// ENTRIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    schema_id: Arc<str>,
    fingerprint: Fingerprint,
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    result: ValidationResult,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, `0.0` before the first lookup.
    pub hit_rate: f64,
    /// Entries currently stored, expired ones included until touched.
    pub size: usize,
}

// ============================================================================
// VALIDATION CACHE
// ============================================================================

/// Thread-safe memo of validation results.
#[derive(Debug)]
pub struct ValidationCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    config: CacheConfig,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ValidationCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let entries = match config.max_size {
            Some(n) => LruCache::new(NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
            ttl: config.time_to_live(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn key(&self, value: &Value, schema_id: &str) -> CacheKey {
        CacheKey {
            schema_id: schema_id.into(),
            fingerprint: Fingerprint::of(value, self.config.fingerprint),
        }
    }

    fn miss(&self, schema_id: &str) -> Option<ValidationResult> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(schema_id, "validation cache miss");
        None
    }

    /// Cached result for `value` under `schema_id`.
    pub fn get(&self, value: &Value, schema_id: &str) -> Option<ValidationResult> {
        let key = self.key(value, schema_id);
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get(&key) else {
            return self.miss(schema_id);
        };
        if entry.is_expired(Instant::now()) {
            entries.pop(&key);
            trace!(schema_id, "validation cache entry expired");
            return self.miss(schema_id);
        }
        if self.config.fingerprint == FingerprintMode::Structural
            && !same_content(&entry.value, value)
        {
            return self.miss(schema_id);
        }
        let result = entry.result.clone();
        drop(entries);
        self.hits.fetch_add(1, Ordering::Relaxed);
        trace!(schema_id, "validation cache hit");
        Some(result)
    }

    /// Stores `result` for `value` under `schema_id`, replacing any previous
    /// entry for the same key.
    pub fn set(&self, value: &Value, schema_id: &str, result: ValidationResult) {
        let key = self.key(value, schema_id);
        let entry = CacheEntry {
            value: value.clone(),
            result,
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };
        let evicted = self.entries.lock().push(key.clone(), entry);
        if let Some((old, _)) = evicted
            && old != key
        {
            trace!(schema_id = %old.schema_id, "validation cache evicted entry");
        }
    }

    /// Cached result, or the result of `validator.validate(value)`, which
    /// is then stored.
    pub fn get_or_validate<V>(
        &self,
        value: &Value,
        schema_id: &str,
        validator: &V,
    ) -> ValidationResult
    where
        V: Validate + ?Sized,
    {
        if let Some(result) = self.get(value, schema_id) {
            return result;
        }
        let result = validator.validate(value);
        self.set(value, schema_id, result.clone());
        result
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        let dropped = {
            let mut entries = self.entries.lock();
            let n = entries.len();
            entries.clear();
            n
        };
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!(dropped, "validation cache cleared");
    }

    /// Removes expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "validation cache purged expired entries");
        }
        expired.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            size: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{number, string};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_hit_after_set() {
        let cache = ValidationCache::default();
        let value = Value::from("a");
        assert!(cache.get(&value, "s").is_none());
        cache.set(&value, "s", Ok(value.clone()));
        assert_eq!(cache.get(&value, "s"), Some(Ok(Value::from("a"))));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_schema_ids_are_isolated() {
        let cache = ValidationCache::default();
        let value = Value::from(1);
        cache.set(&value, "a", Ok(value.clone()));
        assert!(cache.get(&value, "b").is_none());
    }

    #[test]
    fn test_lru_drops_least_recently_used() {
        let cache = ValidationCache::new(CacheConfig::lru(2));
        let (a, b, c) = (Value::from("a"), Value::from("b"), Value::from("c"));
        cache.set(&a, "s", Ok(a.clone()));
        cache.set(&b, "s", Ok(b.clone()));
        assert!(cache.get(&a, "s").is_some());
        cache.set(&c, "s", Ok(c.clone()));
        assert!(cache.get(&b, "s").is_none());
        assert!(cache.get(&a, "s").is_some());
        assert!(cache.get(&c, "s").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_ttl_expires_entries() {
        let cache = ValidationCache::new(CacheConfig::ttl(Duration::ZERO));
        let value = Value::from(1);
        cache.set(&value, "s", Ok(value.clone()));
        assert!(cache.get(&value, "s").is_none());
        assert!(cache.is_empty());

        cache.set(&value, "s", Ok(value.clone()));
        assert_eq!(cache.purge_expired(), 1);
    }

    #[test]
    fn test_identity_fingerprint_ignores_equal_copies() {
        let cache = ValidationCache::default();
        let shared = Value::from(json!({"a": 1}));
        cache.set(&shared, "s", Ok(shared.clone()));
        assert!(cache.get(&shared.clone(), "s").is_some());
        assert!(cache.get(&Value::from(json!({"a": 1})), "s").is_none());
    }

    #[test]
    fn test_structural_fingerprint_matches_equal_copies() {
        let cache = ValidationCache::new(
            CacheConfig::default().with_fingerprint(FingerprintMode::Structural),
        );
        let schema = number();
        let input = Value::from(json!([1, 2]));
        cache.set(&input, "s", Ok(input.clone()));
        assert!(cache.get(&Value::from(json!([1, 2])), "s").is_some());
        assert!(cache.get(&Value::from(json!([2, 1])), "s").is_none());
        assert!(cache.get_or_validate(&Value::from(1), "n", &schema).is_ok());
    }

    #[test]
    fn test_get_or_validate_memoizes_errors() {
        let cache = ValidationCache::default();
        let schema = string().min(3);
        let input = Value::from("ab");
        let first = cache.get_or_validate(&input, "name", &schema);
        let second = cache.get_or_validate(&input, "name", &schema);
        assert!(first.is_err());
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_signed_zero_results_are_cached_apart() {
        use crate::combinators::SchemaExt;

        let reciprocal = number().transform(|v| Value::from(1.0 / v.as_f64().unwrap_or(f64::NAN)));
        for mode in [FingerprintMode::Identity, FingerprintMode::Structural] {
            let cache = ValidationCache::new(CacheConfig::default().with_fingerprint(mode));
            let positive = cache.get_or_validate(&Value::from(0.0), "recip", &reciprocal);
            let negative = cache.get_or_validate(&Value::from(-0.0), "recip", &reciprocal);
            assert_eq!(positive, Ok(Value::from(f64::INFINITY)));
            assert_eq!(negative, Ok(Value::from(f64::NEG_INFINITY)));
            assert_eq!(cache.stats().misses, 2);
        }
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = ValidationCache::default();
        let value = Value::from(true);
        cache.set(&value, "s", Ok(value.clone()));
        let _ = cache.get(&value, "s");
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: CacheConfig =
            serde_json::from_value(json!({"policy": "ttl", "fingerprint": "structural"})).unwrap();
        assert_eq!(config.policy, CachePolicy::Ttl);
        assert_eq!(config.max_size, Some(DEFAULT_MAX_SIZE));
        assert_eq!(config.fingerprint, FingerprintMode::Structural);
        assert_eq!(config.time_to_live(), Some(Duration::from_millis(DEFAULT_TTL_MS)));
    }
}
