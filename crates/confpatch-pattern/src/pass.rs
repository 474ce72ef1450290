//! Pass specifiers on root patch names.
//!
//! `@PART[x]:HAS[...]:AFTER[Foo]` is scheduled in the `:AFTER[Foo]` pass.
//! Tags are split on `:` outside brackets and matched case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::brackets::{is_bracket_balanced, split_top_level};
use crate::error::PatternError;

/// Scheduling pass a root patch asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "pass", content = "identifier", rename_all = "snake_case")]
pub enum PassSpecifier {
    First,
    Before(String),
    For(String),
    After(String),
    Last(String),
    Final,
}

impl PassSpecifier {
    /// Identifier a mod-scoped specifier refers to.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            PassSpecifier::Before(id)
            | PassSpecifier::For(id)
            | PassSpecifier::After(id)
            | PassSpecifier::Last(id) => Some(id),
            PassSpecifier::First | PassSpecifier::Final => None,
        }
    }
}

impl fmt::Display for PassSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassSpecifier::First => write!(f, ":FIRST"),
            PassSpecifier::Before(id) => write!(f, ":BEFORE[{}]", id),
            PassSpecifier::For(id) => write!(f, ":FOR[{}]", id),
            PassSpecifier::After(id) => write!(f, ":AFTER[{}]", id),
            PassSpecifier::Last(id) => write!(f, ":LAST[{}]", id),
            PassSpecifier::Final => write!(f, ":FINAL"),
        }
    }
}

/// Split one `:`-separated tag into its key and optional bracket value.
fn split_tag(tag: &str) -> Option<(&str, Option<&str>)> {
    match tag.find('[') {
        None => Some((tag, None)),
        Some(open) if tag.ends_with(']') => Some((&tag[..open], Some(&tag[open + 1..tag.len() - 1]))),
        Some(_) => None,
    }
}

fn specifier_for(key: &str, value: Option<&str>, name: &str) -> Result<Option<PassSpecifier>, PatternError> {
    let upper = key.trim().to_ascii_uppercase();
    let takes_value = match upper.as_str() {
        "FIRST" | "FINAL" => false,
        "BEFORE" | "FOR" | "AFTER" | "LAST" => true,
        _ => return Ok(None),
    };

    if !takes_value {
        if value.is_some() {
            return Err(PatternError::UnexpectedSpecifierValue {
                tag: upper,
                name: name.to_string(),
            });
        }
        return Ok(Some(if upper == "FIRST" {
            PassSpecifier::First
        } else {
            PassSpecifier::Final
        }));
    }

    let id = match value.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(PatternError::MissingSpecifierValue {
                tag: upper,
                name: name.to_string(),
            })
        }
    };
    Ok(Some(match upper.as_str() {
        "BEFORE" => PassSpecifier::Before(id),
        "FOR" => PassSpecifier::For(id),
        "AFTER" => PassSpecifier::After(id),
        _ => PassSpecifier::Last(id),
    }))
}

/// Find the pass specifier on `name` without modifying it.
pub fn parse_pass_specifier(name: &str) -> Result<Option<PassSpecifier>, PatternError> {
    strip_pass_specifier(name).map(|(_, specifier)| specifier)
}

/// Remove the pass specifier from `name`.
///
/// Returns the remaining name and the specifier, if one was present. More
/// than one specifier, or unbalanced brackets, is an error.
pub fn strip_pass_specifier(name: &str) -> Result<(String, Option<PassSpecifier>), PatternError> {
    if !is_bracket_balanced(name) {
        return Err(PatternError::UnbalancedBrackets(name.to_string()));
    }

    let segments = split_top_level(name, &[':']);
    let mut kept: Vec<&str> = Vec::with_capacity(segments.len());
    let mut found: Option<PassSpecifier> = None;

    for (i, segment) in segments.into_iter().enumerate() {
        if i == 0 {
            kept.push(segment);
            continue;
        }
        let specifier = match split_tag(segment) {
            Some((key, value)) => specifier_for(key, value, name)?,
            None => None,
        };
        match specifier {
            Some(specifier) => {
                if found.is_some() {
                    return Err(PatternError::MultiplePassSpecifiers(name.to_string()));
                }
                found = Some(specifier);
            }
            None => kept.push(segment),
        }
    }

    Ok((kept.join(":"), found))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_specifier() {
        let (name, spec) = strip_pass_specifier("@PART[x]:HAS[#a[b]]").unwrap();
        assert_eq!(name, "@PART[x]:HAS[#a[b]]");
        assert_eq!(spec, None);
    }

    #[test]
    fn test_each_specifier() {
        let cases = [
            ("@A:FIRST", PassSpecifier::First),
            ("@A:final", PassSpecifier::Final),
            ("@A:BEFORE[Foo]", PassSpecifier::Before("Foo".into())),
            ("@A:For[Foo]", PassSpecifier::For("Foo".into())),
            ("@A:AFTER[Foo]", PassSpecifier::After("Foo".into())),
            ("@A:LAST[Foo]", PassSpecifier::Last("Foo".into())),
        ];
        for (input, expected) in cases {
            let (name, spec) = strip_pass_specifier(input).unwrap();
            assert_eq!(name, "@A", "{}", input);
            assert_eq!(spec, Some(expected));
        }
    }

    #[test]
    fn test_specifier_in_middle_is_removed() {
        let (name, spec) = strip_pass_specifier("@PART[x]:FOR[Foo]:HAS[#a[b]]").unwrap();
        assert_eq!(name, "@PART[x]:HAS[#a[b]]");
        assert_eq!(spec, Some(PassSpecifier::For("Foo".into())));
    }

    #[test]
    fn test_colon_inside_brackets_is_not_a_tag() {
        let (name, spec) = strip_pass_specifier("@PART[x]:HAS[@M[y]:HAS[#k[v]]]:AFTER[Z]").unwrap();
        assert_eq!(name, "@PART[x]:HAS[@M[y]:HAS[#k[v]]]");
        assert_eq!(spec, Some(PassSpecifier::After("Z".into())));
    }

    #[test]
    fn test_multiple_specifiers_is_error() {
        let err = strip_pass_specifier("@A:FIRST:FOR[Foo]").unwrap_err();
        assert!(matches!(err, PatternError::MultiplePassSpecifiers(_)));
    }

    #[test]
    fn test_specifier_value_rules() {
        assert!(matches!(
            strip_pass_specifier("@A:FIRST[x]"),
            Err(PatternError::UnexpectedSpecifierValue { .. })
        ));
        assert!(matches!(
            strip_pass_specifier("@A:FOR"),
            Err(PatternError::MissingSpecifierValue { .. })
        ));
        assert!(matches!(
            strip_pass_specifier("@A:AFTER[]"),
            Err(PatternError::MissingSpecifierValue { .. })
        ));
    }

    #[test]
    fn test_unbalanced_is_error() {
        assert!(matches!(
            strip_pass_specifier("@A[x:FOR[y]"),
            Err(PatternError::UnbalancedBrackets(_))
        ));
    }
}
