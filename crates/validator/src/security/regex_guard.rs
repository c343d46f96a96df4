//! ReDoS-safe regular expression execution.
//!
//! A [`GuardedRegex`] classifies its pattern once, at construction. Patterns
//! that can backtrack catastrophically in a backtracking engine are marked
//! with a [`PatternRisk`] and are never executed; every match attempt on
//! them fails with [`RegexGuardError::UnsafePattern`]. The classification is
//! a conservative heuristic: it may reject harmless patterns, it must not
//! accept the classic exponential shapes.
//!
//! Safe patterns run on the `regex` crate's engine with two extra limits
//! from [`SecurityLimits`]: an input length cap checked before the engine is
//! touched, and a wall-clock deadline measured around the match.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Regex;

use super::SecurityLimits;
use crate::foundation::ErrorCode;

/// Why a pattern was classified as dangerous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternRisk {
    /// A repeated group that itself contains a quantifier, e.g. `(a+)+`.
    NestedQuantifier,
    /// A repeated alternation whose branches can start with the same
    /// character, e.g. `(a|ab)*`.
    OverlappingAlternation,
    /// `\1`, `\k<name>`.
    Backreference,
    /// `(?=`, `(?!`, `(?<=`, `(?<!`.
    Lookaround,
    /// Pattern source longer than the configured maximum.
    TooLong,
}

impl fmt::Display for PatternRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NestedQuantifier => "nested quantifier",
            Self::OverlappingAlternation => "quantified alternation with overlapping branches",
            Self::Backreference => "backreference",
            Self::Lookaround => "lookaround assertion",
            Self::TooLong => "pattern too long",
        })
    }
}

/// A match attempt the guard refused or aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegexGuardError {
    #[error("input of {len} characters exceeds the limit of {max}")]
    InputTooLong { len: usize, max: usize },

    #[error("pattern refused: {0}")]
    UnsafePattern(PatternRisk),

    #[error("regex execution took {elapsed:?}, deadline {deadline:?}")]
    Timeout { elapsed: Duration, deadline: Duration },
}

impl RegexGuardError {
    /// Validation code reported for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InputTooLong { .. } => ErrorCode::SecurityInputTooLong,
            Self::UnsafePattern(_) => ErrorCode::SecurityUnsafePattern,
            Self::Timeout { .. } => ErrorCode::SecurityRegexTimeout,
        }
    }
}

/// A regular expression wrapped in the ReDoS guard.
#[derive(Debug, Clone)]
pub struct GuardedRegex {
    source: Arc<str>,
    regex: Option<Regex>,
    risk: Option<PatternRisk>,
}

impl GuardedRegex {
    /// Classifies and compiles `pattern`.
    ///
    /// Dangerous patterns are accepted but never compiled, so lookaround and
    /// backreferences (which the `regex` crate rejects) still produce a
    /// guard that reports [`RegexGuardError::UnsafePattern`] at match time.
    ///
    /// # Errors
    ///
    /// Returns the compile error of a pattern classified as safe that the
    /// engine cannot parse.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let risk = classify(pattern);
        let regex = match risk {
            Some(_) => None,
            None => Some(Regex::new(pattern)?),
        };
        Ok(Self {
            source: pattern.into(),
            regex,
            risk,
        })
    }

    /// Pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Risk found at construction, if any.
    #[must_use]
    pub const fn risk(&self) -> Option<PatternRisk> {
        self.risk
    }

    /// `true` when the pattern will be executed under `limits`.
    #[must_use]
    pub fn is_safe(&self, limits: &SecurityLimits) -> bool {
        self.risk.is_none() && self.source.chars().count() <= limits.max_pattern_len
    }

    /// Runs the pattern against `input` under `limits`.
    ///
    /// # Errors
    ///
    /// - [`RegexGuardError::InputTooLong`] before the engine is touched.
    /// - [`RegexGuardError::UnsafePattern`] for dangerous or oversized
    ///   patterns.
    /// - [`RegexGuardError::Timeout`] when the match did not finish within
    ///   the deadline. The `regex` engine runs in linear time, so the
    ///   deadline bounds pathological input sizes rather than backtracking.
    pub fn is_match(&self, input: &str, limits: &SecurityLimits) -> Result<bool, RegexGuardError> {
        let max = limits.max_regex_input_len;
        if input.len() > max {
            let len = input.chars().count();
            if len > max {
                return Err(RegexGuardError::InputTooLong { len, max });
            }
        }

        let regex = match (&self.risk, &self.regex) {
            (Some(risk), _) => return Err(RegexGuardError::UnsafePattern(*risk)),
            (None, None) => return Err(RegexGuardError::UnsafePattern(PatternRisk::TooLong)),
            (None, Some(regex)) => regex,
        };
        if self.source.chars().count() > limits.max_pattern_len {
            return Err(RegexGuardError::UnsafePattern(PatternRisk::TooLong));
        }

        let deadline = limits.regex_timeout();
        let started = Instant::now();
        let matched = regex.is_match(input);
        let elapsed = started.elapsed();
        if elapsed >= deadline {
            return Err(RegexGuardError::Timeout { elapsed, deadline });
        }
        Ok(matched)
    }
}

impl From<Regex> for GuardedRegex {
    fn from(regex: Regex) -> Self {
        let risk = classify(regex.as_str());
        Self {
            source: regex.as_str().into(),
            regex: Some(regex),
            risk,
        }
    }
}

impl From<&Regex> for GuardedRegex {
    fn from(regex: &Regex) -> Self {
        Self::from(regex.clone())
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// First thing an alternation branch can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom {
    Char(char),
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
    /// `.`, bracket classes, groups, unknown escapes.
    Wide,
    /// A branch that can match nothing.
    Empty,
}

impl Atom {
    fn contains(self, c: char) -> bool {
        match self {
            Self::Char(x) => x == c,
            Self::Digit => c.is_ascii_digit(),
            Self::NotDigit => !c.is_ascii_digit(),
            Self::Word => c.is_alphanumeric() || c == '_',
            Self::NotWord => !(c.is_alphanumeric() || c == '_'),
            Self::Space => c.is_whitespace(),
            Self::NotSpace => !c.is_whitespace(),
            Self::Wide | Self::Empty => true,
        }
    }

    fn overlaps(self, other: Self) -> bool {
        use Atom::{Char, Digit, Empty, NotDigit, NotSpace, NotWord, Space, Wide, Word};

        match (self, other) {
            (Empty | Wide, _) | (_, Empty | Wide) => true,
            (Char(c), atom) | (atom, Char(c)) => atom.contains(c),
            (a, b) if a == b => true,
            (Digit, NotDigit)
            | (NotDigit, Digit)
            | (Word, NotWord)
            | (NotWord, Word)
            | (Space, NotSpace)
            | (NotSpace, Space)
            | (Digit | Word, Space)
            | (Space, Digit | Word)
            | (Digit, NotWord)
            | (NotWord, Digit) => false,
            _ => true,
        }
    }
}

#[derive(Debug)]
struct Frame {
    quantified_inside: bool,
    branch_starts: Vec<Option<Atom>>,
}

impl Frame {
    fn new() -> Self {
        Self {
            quantified_inside: false,
            branch_starts: vec![None],
        }
    }

    fn saw(&mut self, atom: Atom) {
        if let Some(slot @ None) = self.branch_starts.last_mut() {
            *slot = Some(atom);
        }
    }

    fn ambiguous(&self) -> bool {
        let starts: Vec<Atom> = self
            .branch_starts
            .iter()
            .map(|s| s.unwrap_or(Atom::Empty))
            .collect();
        starts
            .iter()
            .enumerate()
            .any(|(i, a)| starts[i + 1..].iter().any(|b| a.overlaps(*b)))
    }
}

#[derive(Debug, Clone, Copy)]
enum Last {
    Simple,
    Group { quantified: bool, ambiguous: bool },
}

/// Scans `pattern` for shapes that backtrack exponentially.
pub(crate) fn classify(pattern: &str) -> Option<PatternRisk> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut stack = vec![Frame::new()];
    let mut last: Option<Last> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                let Some(&e) = chars.get(i + 1) else {
                    break;
                };
                let atom = match e {
                    '1'..='9' => return Some(PatternRisk::Backreference),
                    'k' if chars.get(i + 2) == Some(&'<') => {
                        return Some(PatternRisk::Backreference);
                    }
                    'b' | 'B' | 'A' | 'z' | 'Z' => None,
                    'd' => Some(Atom::Digit),
                    'D' => Some(Atom::NotDigit),
                    'w' => Some(Atom::Word),
                    'W' => Some(Atom::NotWord),
                    's' => Some(Atom::Space),
                    'S' => Some(Atom::NotSpace),
                    'p' | 'P' | 'x' | 'u' => {
                        if chars.get(i + 2) == Some(&'{') {
                            while i < chars.len() && chars[i] != '}' {
                                i += 1;
                            }
                            i = i.saturating_sub(1);
                        }
                        Some(Atom::Wide)
                    }
                    'n' => Some(Atom::Char('\n')),
                    't' => Some(Atom::Char('\t')),
                    'r' => Some(Atom::Char('\r')),
                    other if other.is_ascii_alphanumeric() => Some(Atom::Wide),
                    other => Some(Atom::Char(other)),
                };
                i += 2;
                if let Some(atom) = atom {
                    current(&mut stack).saw(atom);
                    last = Some(Last::Simple);
                } else {
                    last = None;
                }
                continue;
            }
            '[' => {
                i = skip_class(&chars, i);
                current(&mut stack).saw(Atom::Wide);
                last = Some(Last::Simple);
                continue;
            }
            '(' => {
                if chars.get(i + 1) == Some(&'?') {
                    let rest: String = chars[i + 2..chars.len().min(i + 5)].iter().collect();
                    if rest.starts_with('=')
                        || rest.starts_with('!')
                        || rest.starts_with("<=")
                        || rest.starts_with("<!")
                    {
                        return Some(PatternRisk::Lookaround);
                    }
                    match skip_group_header(&chars, i + 2) {
                        GroupHeader::Flags(next) => {
                            i = next;
                            continue;
                        }
                        GroupHeader::Group(next) => {
                            current(&mut stack).saw(Atom::Wide);
                            stack.push(Frame::new());
                            last = None;
                            i = next;
                            continue;
                        }
                    }
                }
                current(&mut stack).saw(Atom::Wide);
                stack.push(Frame::new());
                last = None;
            }
            ')' => {
                if stack.len() > 1 {
                    if let Some(frame) = stack.pop() {
                        let quantified = frame.quantified_inside;
                        let parent = current(&mut stack);
                        parent.quantified_inside |= quantified;
                        last = Some(Last::Group {
                            quantified,
                            ambiguous: frame.branch_starts.len() > 1 && frame.ambiguous(),
                        });
                    }
                } else {
                    last = Some(Last::Simple);
                }
            }
            '|' => {
                current(&mut stack).branch_starts.push(None);
                last = None;
            }
            '*' | '+' | '?' | '{' => {
                let quantifier = if c == '{' {
                    parse_braces(&chars, i)
                } else {
                    Some((i + 1, c != '?'))
                };
                let Some((mut next, repeating)) = quantifier else {
                    current(&mut stack).saw(Atom::Char('{'));
                    last = Some(Last::Simple);
                    i += 1;
                    continue;
                };
                if matches!(chars.get(next), Some('?' | '+')) {
                    next += 1;
                }
                if let Some(target) = last.take() {
                    if repeating {
                        if let Last::Group {
                            quantified,
                            ambiguous,
                        } = target
                        {
                            if quantified {
                                return Some(PatternRisk::NestedQuantifier);
                            }
                            if ambiguous {
                                return Some(PatternRisk::OverlappingAlternation);
                            }
                        }
                    }
                    current(&mut stack).quantified_inside = true;
                }
                i = next;
                continue;
            }
            '^' | '$' => last = None,
            '.' => {
                current(&mut stack).saw(Atom::Wide);
                last = Some(Last::Simple);
            }
            other => {
                current(&mut stack).saw(Atom::Char(other));
                last = Some(Last::Simple);
            }
        }
        i += 1;
    }

    None
}

fn current(stack: &mut [Frame]) -> &mut Frame {
    let last = stack.len() - 1;
    &mut stack[last]
}

/// Index just past the `]` closing the class that opens at `start`.
fn skip_class(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    let mut depth = 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

enum GroupHeader {
    /// `(?i)`: inline flags, no group opened.
    Flags(usize),
    /// `(?:`, `(?i:`, `(?P<name>`, `(?<name>`: group body starts here.
    Group(usize),
}

fn skip_group_header(chars: &[char], start: usize) -> GroupHeader {
    let mut i = start;
    if matches!(chars.get(i), Some('P' | '<')) {
        while i < chars.len() && chars[i] != '>' {
            i += 1;
        }
        return GroupHeader::Group(i + 1);
    }
    while i < chars.len() {
        match chars[i] {
            ')' => return GroupHeader::Flags(i + 1),
            ':' => return GroupHeader::Group(i + 1),
            _ => i += 1,
        }
    }
    GroupHeader::Group(i)
}

/// Parses `{n}`, `{n,}` or `{n,m}` at `start`. Returns the index after the
/// closing brace and whether the quantifier repeats more than once.
fn parse_braces(chars: &[char], start: usize) -> Option<(usize, bool)> {
    let close = chars[start..].iter().position(|&c| c == '}')? + start;
    let body: String = chars[start + 1..close].iter().collect();
    let (low, high) = match body.split_once(',') {
        Some((low, high)) => (low.trim(), Some(high.trim())),
        None => (body.trim(), None),
    };
    let low: usize = low.parse().ok()?;
    let repeating = match high {
        None => low > 1,
        Some("") => true,
        Some(high) => high.parse::<usize>().ok()? > 1,
    };
    Some((close + 1, repeating))
}
