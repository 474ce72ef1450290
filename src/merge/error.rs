//! Edit errors.
//!
//! Every variant abandons one key or node edit; sibling edits of the same
//! patch still run.

use confpatch_pattern::{Command, Operator, PatternError};
use thiserror::Error;

use crate::path::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("{command} does not take {modifier}")]
    InvalidModifier {
        command: Command,
        modifier: &'static str,
    },

    #[error("{command} is not valid on a {kind}")]
    InvalidCommand { command: Command, kind: &'static str },

    #[error("cannot rename the root node")]
    RenameRoot,

    #[error("index {index} is out of range ({matches} matches)")]
    IndexOutOfRange { index: i64, matches: usize },

    #[error("invalid vector index {index} for value '{value}'")]
    VectorIndexOutOfRange { index: i64, value: String },

    #[error("cannot apply {operator} to non-numeric value '{value}'")]
    NotNumeric { operator: Operator, value: String },

    #[error("{operator} on '{value}' does not produce a finite number")]
    NotFinite { operator: Operator, value: String },

    #[error("malformed regex replacement '{0}' (expected <d>pattern<d>replacement)")]
    MalformedReplacement(String),

    #[error("invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("unbalanced '$' in '{0}'")]
    UnbalancedInterpolation(String),

    #[error("cannot resolve '${placeholder}$': {source}")]
    Unresolved {
        placeholder: String,
        #[source]
        source: PathError,
    },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}
