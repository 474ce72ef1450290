//! Name grammar for configuration patches.
//!
//! Every patch instruction is encoded in a node or key name: a leading
//! command sigil, a selector, optional index and vector suffixes, a
//! trailing operator and `:TAG[...]` clauses. This crate parses those
//! pieces and evaluates the selectors against a node tree.

pub mod brackets;
pub mod command;
pub mod error;
pub mod matcher;
pub mod needs;
pub mod operator;
pub mod pass;
pub mod select;
pub mod wildcard;

pub use brackets::is_bracket_balanced;
pub use command::Command;
pub use error::PatternError;
pub use matcher::{check_constraints, NodeMatcher};
pub use needs::{contains_needs, strip_needs, NeedsExpr, NeedsTerm};
pub use operator::Operator;
pub use pass::{parse_pass_specifier, strip_pass_specifier, PassSpecifier};
pub use select::{ChildSelector, Index, KeySelector, VectorIndex};
pub use wildcard::{value_matches, wildcard_match, Wildcard};
