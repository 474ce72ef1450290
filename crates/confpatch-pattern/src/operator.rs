//! Value-edit operators.
//!
//! A key name may end in an operator character: `@mass *= 2` parses as the
//! key `@mass *` with value `2`, i.e. multiply `mass` by two.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Assign,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `!`
    Exponentiate,
    /// `^`
    RegexReplace,
}

impl Operator {
    /// Strip a trailing operator character from a key name.
    ///
    /// The operator must be separated from the key by whitespace, so
    /// `mass *` multiplies while `mass*` is a wildcard name. Trailing
    /// whitespace after the operator is ignored.
    pub fn parse(name: &str) -> (Operator, &str) {
        let trimmed = name.trim_end();
        let bytes = trimmed.as_bytes();
        if bytes.len() < 2 || !bytes[bytes.len() - 2].is_ascii_whitespace() {
            return (Operator::Assign, trimmed);
        }
        let op = match bytes[bytes.len() - 1] {
            b'+' => Operator::Add,
            b'-' => Operator::Subtract,
            b'*' => Operator::Multiply,
            b'/' => Operator::Divide,
            b'!' => Operator::Exponentiate,
            b'^' => Operator::RegexReplace,
            _ => return (Operator::Assign, trimmed),
        };
        (op, trimmed[..trimmed.len() - 1].trim_end())
    }

    pub fn is_assign(&self) -> bool {
        matches!(self, Operator::Assign)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::Add => "+=",
            Operator::Subtract => "-=",
            Operator::Multiply => "*=",
            Operator::Divide => "/=",
            Operator::Exponentiate => "!=",
            Operator::RegexReplace => "^=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operators() {
        assert_eq!(Operator::parse("mass *"), (Operator::Multiply, "mass"));
        assert_eq!(Operator::parse("mass\t+"), (Operator::Add, "mass"));
        assert_eq!(Operator::parse("mass -  "), (Operator::Subtract, "mass"));
        assert_eq!(Operator::parse("mass /"), (Operator::Divide, "mass"));
        assert_eq!(Operator::parse("mass !"), (Operator::Exponentiate, "mass"));
        assert_eq!(Operator::parse("title ^"), (Operator::RegexReplace, "title"));
    }

    #[test]
    fn test_plain_name_is_assign() {
        assert_eq!(Operator::parse("mass "), (Operator::Assign, "mass"));
        assert_eq!(Operator::parse(""), (Operator::Assign, ""));
    }

    #[test]
    fn test_star_index_is_not_multiply() {
        assert_eq!(Operator::parse("key,*"), (Operator::Assign, "key,*"));
    }

    #[test]
    fn test_unspaced_star_is_wildcard() {
        assert_eq!(Operator::parse("tag*"), (Operator::Assign, "tag*"));
        assert_eq!(Operator::parse("tag+"), (Operator::Assign, "tag+"));
        assert_eq!(Operator::parse("tag* *"), (Operator::Multiply, "tag*"));
    }

    #[test]
    fn test_vector_suffix_then_operator() {
        assert_eq!(Operator::parse("size,0[1] +"), (Operator::Add, "size,0[1]"));
    }
}
