//! Guards against adversarial input.
//!
//! - [`regex_guard`]: refuses to run regular expressions that can backtrack
//!   catastrophically and caps the input handed to the regex engine.
//! - [`object_guard`]: rejects prototype-polluting keys and bounds the
//!   nesting depth of containers.
//!
//! Both are configured by [`SecurityLimits`], which object and string
//! schemas carry per node.

pub mod object_guard;
pub mod regex_guard;

use std::time::Duration;

use serde::Deserialize;

pub use object_guard::{DANGEROUS_KEYS, ObjectGuardError};
pub use regex_guard::{GuardedRegex, PatternRisk, RegexGuardError};

/// Resource limits enforced by the security guards.
///
/// Deserializable with every field optional, so hosts can load overrides
/// from their own configuration:
///
/// ```rust,ignore
/// let limits: SecurityLimits = serde_json::from_str(r#"{ "max_depth": 16 }"#)?;
/// assert_eq!(limits.max_regex_input_len, 10_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecurityLimits {
    /// Deepest container nesting accepted; the root value is depth 0.
    pub max_depth: usize,
    /// Longest string (in characters) handed to the regex engine.
    pub max_regex_input_len: usize,
    /// Wall-clock budget for one regex execution.
    pub regex_timeout_ms: u64,
    /// Longest pattern source (in characters) that will be executed.
    pub max_pattern_len: usize,
}

impl SecurityLimits {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_MAX_REGEX_INPUT_LEN: usize = 10_000;
    pub const DEFAULT_REGEX_TIMEOUT_MS: u64 = 100;
    pub const DEFAULT_MAX_PATTERN_LEN: usize = 1_000;

    /// Regex deadline as a [`Duration`].
    #[must_use]
    pub const fn regex_timeout(&self) -> Duration {
        Duration::from_millis(self.regex_timeout_ms)
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_max_regex_input_len(mut self, len: usize) -> Self {
        self.max_regex_input_len = len;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_regex_timeout_ms(mut self, ms: u64) -> Self {
        self.regex_timeout_ms = ms;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_max_pattern_len(mut self, len: usize) -> Self {
        self.max_pattern_len = len;
        self
    }
}

impl Default for SecurityLimits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_regex_input_len: Self::DEFAULT_MAX_REGEX_INPUT_LEN,
            regex_timeout_ms: Self::DEFAULT_REGEX_TIMEOUT_MS,
            max_pattern_len: Self::DEFAULT_MAX_PATTERN_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = SecurityLimits::default();
        assert_eq!(limits.max_depth, 64);
        assert_eq!(limits.max_regex_input_len, 10_000);
        assert_eq!(limits.regex_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let limits: SecurityLimits = serde_json::from_str(r#"{ "max_depth": 16 }"#).unwrap();
        assert_eq!(limits.max_depth, 16);
        assert_eq!(limits.max_pattern_len, 1_000);
    }
}
