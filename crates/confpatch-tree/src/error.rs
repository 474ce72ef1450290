//! Codec error types.

use thiserror::Error;

/// Errors raised while reading the text format.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("line {line}: unexpected '}}' with no open node")]
    UnexpectedClose { line: usize },

    #[error("line {line}: '{{' without a node name")]
    MissingNodeName { line: usize },

    #[error("line {line}: node name '{name}' is not followed by '{{'")]
    DanglingName { line: usize, name: String },

    #[error("line {line}: key/value pair outside of any node")]
    ValueAtTopLevel { line: usize },

    #[error("unexpected end of input: {open} node(s) still open (innermost '{name}')")]
    UnclosedNode { open: usize, name: String },
}
