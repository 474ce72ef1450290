//! Path queries over the node stack and the catalog.
//!
//! ```text
//! /                 jump to the outermost node being patched
//! @PART[probe]/     jump to the first catalog document matching
//! ../               up one level
//! MODULE[x],1/      descend into a child
//! mass              read a key (last segment only)
//! size,0[2, ]       read element 2 of the first `size`, split on spaces
//! ```
//!
//! A `/` directly after `,` is a separator character, not a segment break.

use confpatch_pattern::select::{matching_values, resolve_position};
use confpatch_pattern::{ChildSelector, Index, KeySelector, PatternError, VectorIndex};
use confpatch_tree::{Node, NodeId};
use thiserror::Error;

use crate::catalog::Catalog;

/// The chain of nodes currently being patched, innermost on top.
///
/// Immutable: pushing borrows the parent, so a stack lives only as long
/// as the recursive call that built it.
#[derive(Debug, Clone, Copy)]
pub struct NodeStack<'a> {
    node: &'a Node,
    parent: Option<&'a NodeStack<'a>>,
    depth: usize,
}

impl<'a> NodeStack<'a> {
    pub fn root(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            depth: 0,
        }
    }

    pub fn push<'s>(&'s self, node: &'s Node) -> NodeStack<'s> {
        NodeStack {
            node,
            parent: Some(self),
            depth: self.depth + 1,
        }
    }

    /// Same position in the stack, different node on top.
    pub fn replace_top<'s>(&'s self, node: &'s Node) -> NodeStack<'s> {
        NodeStack {
            node,
            parent: self.parent,
            depth: self.depth,
        }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn parent(&self) -> Option<&'a NodeStack<'a>> {
        self.parent
    }

    /// Zero for the outermost node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Nodes from the outermost to this one.
    fn frames(&self) -> Vec<Frame<'a>> {
        let mut frames = Vec::with_capacity(self.depth + 1);
        let mut current = Some(self);
        while let Some(stack) = current {
            frames.push(Frame {
                node: stack.node,
                location: Location::frame(stack.depth),
            });
            current = stack.parent;
        }
        frames.reverse();
        frames
    }
}

/// What a [`Location`] path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// A node on the stack, by depth.
    Frame(usize),
    /// A catalog document.
    Document(NodeId),
}

/// A node addressed by anchor plus child indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub anchor: Anchor,
    pub path: Vec<usize>,
}

impl Location {
    pub fn frame(depth: usize) -> Self {
        Self {
            anchor: Anchor::Frame(depth),
            path: Vec::new(),
        }
    }

    pub fn document(id: NodeId) -> Self {
        Self {
            anchor: Anchor::Document(id),
            path: Vec::new(),
        }
    }

    fn child(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            anchor: self.anchor,
            path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("cannot go above the root node in '{0}'")]
    AboveRoot(String),

    #[error("no document matches '{segment}' in '{path}'")]
    NoDocument { segment: String, path: String },

    #[error("no node matches '{segment}' in '{path}'")]
    NoNode { segment: String, path: String },

    #[error("no value matches '{segment}' in '{path}'")]
    NoValue { segment: String, path: String },

    #[error("element index out of range in '{0}'")]
    NoElement(String),

    #[error("path '{0}' does not name a value")]
    NotAValue(String),

    #[error("malformed segment '{segment}': {source}")]
    Pattern {
        segment: String,
        #[source]
        source: PatternError,
    },
}

#[derive(Debug, Clone)]
struct Frame<'r> {
    node: &'r Node,
    location: Location,
}

/// A node found by path.
#[derive(Debug, Clone)]
pub struct ResolvedNode<'r> {
    pub node: &'r Node,
    pub location: Location,
}

/// A key found by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTarget {
    /// Node holding the key
    pub location: Location,
    /// Position of the key in that node's values
    pub key: usize,
    /// The key's whole current value
    pub value: String,
    /// Element addressing, if the path had one
    pub vector: Option<VectorIndex>,
}

impl ValueTarget {
    /// The addressed value: one element, or the whole value.
    pub fn read(&self) -> Result<String, PathError> {
        let vector = match self.vector {
            Some(VectorIndex {
                position: Index::At(n),
                separator,
            }) => (n, separator),
            _ => return Ok(self.value.clone()),
        };
        let (n, separator) = vector;
        let parts: Vec<&str> = split_elements(&self.value, separator);
        resolve_position(n, parts.len())
            .map(|i| parts[i].to_string())
            .ok_or_else(|| PathError::NoElement(self.value.clone()))
    }
}

/// Split a delimited value, dropping empty elements.
pub fn split_elements(value: &str, separator: char) -> Vec<&str> {
    value.split(separator).filter(|s| !s.is_empty()).collect()
}

/// Split off the first segment, honouring brackets and the `,/` escape.
fn split_segment(path: &str) -> (&str, Option<&str>) {
    let mut depth = 0i32;
    let mut previous = None;
    for (i, c) in path.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            '/' if depth == 0 && previous != Some(',') => {
                return (&path[..i], Some(&path[i + 1..]));
            }
            _ => {}
        }
        previous = Some(c);
    }
    (path, None)
}

fn parse_selector(segment: &str) -> Result<ChildSelector, PathError> {
    ChildSelector::parse(segment).map_err(|source| PathError::Pattern {
        segment: segment.to_string(),
        source,
    })
}

/// Walk all node segments of `path`. When `stop_at_key` is set, the final
/// segment is returned unconsumed.
fn walk<'r, 'p>(
    stack: &NodeStack<'r>,
    catalog: &'r Catalog,
    path: &'p str,
    stop_at_key: bool,
) -> Result<(Frame<'r>, Option<&'p str>), PathError> {
    let mut frames = stack.frames();
    let mut rest = path;

    loop {
        if let Some(after) = rest.strip_prefix('/') {
            frames.truncate(1);
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix("../") {
            if frames.len() <= 1 {
                return Err(PathError::AboveRoot(path.to_string()));
            }
            frames.pop();
            rest = after;
            continue;
        }

        let (segment, next) = split_segment(rest);
        if next.is_none() && stop_at_key {
            let top = frames.pop().ok_or_else(|| PathError::NotAValue(path.to_string()))?;
            if segment.is_empty() {
                return Err(PathError::NotAValue(path.to_string()));
            }
            return Ok((top, Some(segment)));
        }

        if let Some(selector) = segment.strip_prefix('@') {
            let selector = parse_selector(selector)?;
            let (_, document) = catalog
                .documents()
                .find(|(_, doc)| selector.matches(doc))
                .ok_or_else(|| PathError::NoDocument {
                    segment: segment.to_string(),
                    path: path.to_string(),
                })?;
            frames = vec![Frame {
                node: document,
                location: Location::document(document.id()),
            }];
        } else if !segment.is_empty() {
            let selector = parse_selector(segment)?;
            let top = frames.last().ok_or_else(|| PathError::AboveRoot(path.to_string()))?;
            let index = selector.select_one(top.node).ok_or_else(|| PathError::NoNode {
                segment: segment.to_string(),
                path: path.to_string(),
            })?;
            let child = Frame {
                node: &top.node.nodes[index],
                location: top.location.child(index),
            };
            frames.push(child);
        }

        match next {
            Some(after) => rest = after,
            None => break,
        }
    }

    let top = frames.pop().ok_or_else(|| PathError::AboveRoot(path.to_string()))?;
    Ok((top, None))
}

/// Resolve a path to a node.
pub fn resolve_node<'r>(
    stack: &NodeStack<'r>,
    catalog: &'r Catalog,
    path: &str,
) -> Result<ResolvedNode<'r>, PathError> {
    let (frame, _) = walk(stack, catalog, path, false)?;
    Ok(ResolvedNode {
        node: frame.node,
        location: frame.location,
    })
}

/// Resolve a path whose last segment names a key.
pub fn resolve_value<'r>(
    stack: &NodeStack<'r>,
    catalog: &'r Catalog,
    path: &str,
) -> Result<ValueTarget, PathError> {
    let (frame, key) = walk(stack, catalog, path, true)?;
    let key = key.ok_or_else(|| PathError::NotAValue(path.to_string()))?;
    let selector = KeySelector::parse(key).map_err(|source| PathError::Pattern {
        segment: key.to_string(),
        source,
    })?;

    let matches = matching_values(frame.node, &selector.name);
    let position = match selector.index {
        Some(Index::At(n)) => resolve_position(n, matches.len()),
        _ => (!matches.is_empty()).then_some(0),
    };
    let index = position
        .map(|p| matches[p])
        .ok_or_else(|| PathError::NoValue {
            segment: key.to_string(),
            path: path.to_string(),
        })?;

    Ok(ValueTarget {
        location: frame.location,
        key: index,
        value: frame.node.values[index].value.clone(),
        vector: selector.vector,
    })
}
