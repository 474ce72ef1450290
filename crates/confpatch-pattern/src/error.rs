//! Pattern error types.

use thiserror::Error;

use crate::command::Command;

/// Syntax errors in a node or key name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("name is empty")]
    EmptyName,

    #[error("unbalanced square brackets in '{0}' (replace spaces with '?')")]
    UnbalancedBrackets(String),

    #[error("more than one pass specifier in '{0}'")]
    MultiplePassSpecifiers(String),

    #[error("pass specifier :{tag} takes no value in '{name}'")]
    UnexpectedSpecifierValue { tag: String, name: String },

    #[error("pass specifier :{tag} requires a value in '{name}'")]
    MissingSpecifierValue { tag: String, name: String },

    #[error("{command} command is not valid on a root node: '{name}'")]
    InvalidRootCommand { command: Command, name: String },

    #[error("pass specifier on an insert node (not a patch): '{0}'")]
    SpecifierOnInsert(String),

    #[error("malformed selector '{0}'")]
    MalformedSelector(String),

    #[error("cannot parse index '{index}' in '{name}'")]
    InvalidIndex { index: String, name: String },

    #[error("invalid wildcard pattern '{0}'")]
    InvalidWildcard(String),

    #[error("unterminated :NEEDS[ in '{0}'")]
    UnterminatedNeeds(String),
}
