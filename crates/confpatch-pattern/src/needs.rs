//! `:NEEDS[...]` dependency expressions.
//!
//! `A,B|!C` means "A and (B or not C)". `&` is accepted as an alternative
//! clause separator. Identifiers compare case-insensitively.

use std::fmt;

use crate::brackets::{find_ignore_case, matching_close};
use crate::error::PatternError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedsTerm {
    pub negated: bool,
    pub identifier: String,
}

/// Conjunction of disjunctions of possibly negated identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedsExpr {
    clauses: Vec<Vec<NeedsTerm>>,
}

impl NeedsExpr {
    pub fn parse(expr: &str) -> Self {
        let clauses = expr
            .split([',', '&'])
            .map(|clause| {
                clause
                    .split('|')
                    .map(str::trim)
                    .filter(|term| !term.is_empty())
                    .map(|term| match term.strip_prefix('!') {
                        Some(id) => NeedsTerm {
                            negated: true,
                            identifier: id.trim().to_string(),
                        },
                        None => NeedsTerm {
                            negated: false,
                            identifier: term.to_string(),
                        },
                    })
                    .collect()
            })
            .collect();
        Self { clauses }
    }

    /// Evaluate with `is_known` answering membership.
    ///
    /// A clause with no terms is unsatisfiable.
    pub fn is_satisfied(&self, mut is_known: impl FnMut(&str) -> bool) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|term| is_known(&term.identifier) != term.negated)
        })
    }

    pub fn clauses(&self) -> &[Vec<NeedsTerm>] {
        &self.clauses
    }
}

impl fmt::Display for NeedsExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            for (j, term) in clause.iter().enumerate() {
                if j > 0 {
                    f.write_str("|")?;
                }
                if term.negated {
                    f.write_str("!")?;
                }
                f.write_str(&term.identifier)?;
            }
        }
        Ok(())
    }
}

pub fn contains_needs(name: &str) -> bool {
    find_ignore_case(name, ":NEEDS[").is_some()
}

/// Remove the first `:NEEDS[...]` clause from `name`.
///
/// Returns `None` when there is no clause, otherwise the name without it
/// and the parsed expression.
pub fn strip_needs(name: &str) -> Result<Option<(String, NeedsExpr)>, PatternError> {
    let start = match find_ignore_case(name, ":NEEDS[") {
        Some(start) => start,
        None => return Ok(None),
    };
    let open = start + ":NEEDS".len();
    let close =
        matching_close(name, open).ok_or_else(|| PatternError::UnterminatedNeeds(name.to_string()))?;
    let expr = NeedsExpr::parse(&name[open + 1..close]);
    let stripped = format!("{}{}", &name[..start], &name[close + 1..]);
    Ok(Some((stripped, expr)))
}
