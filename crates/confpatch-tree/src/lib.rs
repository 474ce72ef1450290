//! Configuration node tree
//!
//! The document model shared by every confpatch component, plus the text
//! format used to read and write documents.

pub mod codec;
pub mod error;
pub mod node;

pub use codec::{document_to_text, parse_document, parse_node, to_text};
pub use error::CodecError;
pub use node::{Node, NodeId, Value};
