//! `*` / `?` wildcard matching.
//!
//! A pattern is compiled into an anchored regular expression: every
//! character is escaped except `*` (any run) and `?` (any one character).

use regex_lite::Regex;

use crate::error::PatternError;

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct Wildcard {
    pattern: String,
    regex: Regex,
}

impl Wildcard {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        for c in pattern.chars() {
            match c {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                c => source.push_str(&regex_lite::escape(c.encode_utf8(&mut [0u8; 4]))),
            }
        }
        source.push('$');
        let regex =
            Regex::new(&source).map_err(|_| PatternError::InvalidWildcard(pattern.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn has_wildcards(pattern: &str) -> bool {
        pattern.contains('*') || pattern.contains('?')
    }
}

/// One-shot wildcard match. Patterns that fail to compile match nothing.
pub fn wildcard_match(s: &str, pattern: &str) -> bool {
    if !Wildcard::has_wildcards(pattern) {
        return s == pattern;
    }
    Wildcard::new(pattern).map(|w| w.is_match(s)).unwrap_or(false)
}

/// Match a value against a pattern that may be a numeric comparison.
///
/// `<N` and `>N` compare numerically when both sides parse as numbers;
/// anything else is a wildcard match.
pub fn value_matches(value: &str, pattern: &str) -> bool {
    let mut chars = pattern.chars();
    if let Some(cmp @ ('<' | '>')) = chars.next() {
        if let Ok(limit) = chars.as_str().trim().parse::<f64>() {
            return match value.trim().parse::<f64>() {
                Ok(v) if cmp == '<' => v < limit,
                Ok(v) => v > limit,
                Err(_) => false,
            };
        }
    }
    wildcard_match(value, pattern)
}
