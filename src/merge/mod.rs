//! The recursive tree merge.
//!
//! [`modify_node`] applies one patch node to the node on top of a
//! [`NodeStack`] and returns the edited copy; the input is never changed.
//! Keys are applied first, in order, then children, in order. Each edit
//! sees the result of the edits before it.
//!
//! Special assignments (`*path = value`) may target any node on the stack
//! or another catalog document. They are queued as [`PendingWrite`]s:
//! writes to a stack node are applied by the call that owns that node as
//! soon as control returns to it; writes to catalog documents are left for
//! the scheduler.

mod arith;
mod error;
mod interpolate;
mod nodes;
mod values;

pub use arith::format_number;
pub use error::EditError;
pub use interpolate::interpolate;
pub use values::combine;

use confpatch_tree::{Node, NodeId};
use tracing::debug;

use crate::catalog::{Catalog, Origin};
use crate::extract::PATCH_LOOP;
use crate::path::{Anchor, Location, NodeStack};
use crate::progress::Progress;

/// A value assignment waiting for its target node to be writable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub location: Location,
    pub key: usize,
    pub value: String,
}

impl PendingWrite {
    /// Apply to `root`, the node the location's anchor refers to.
    pub fn apply(&self, root: &mut Node) -> bool {
        match root
            .descendant_mut(&self.location.path)
            .and_then(|node| node.values.get_mut(self.key))
        {
            Some(value) => {
                value.value = self.value.clone();
                true
            }
            None => false,
        }
    }
}

/// Shared state for one patch applied to one document.
pub struct MergeContext<'c> {
    catalog: &'c Catalog,
    progress: &'c Progress,
    origin: &'c Origin,
    target: Origin,
    pending: Vec<PendingWrite>,
    errors: usize,
}

impl<'c> MergeContext<'c> {
    pub fn new(catalog: &'c Catalog, progress: &'c Progress, origin: &'c Origin, target: Origin) -> Self {
        Self {
            catalog,
            progress,
            origin,
            target,
            pending: Vec::new(),
            errors: 0,
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Errors reported through this context so far.
    pub fn errors(&self) -> usize {
        self.errors
    }

    fn report(&mut self, what: &str, error: EditError) {
        self.errors += 1;
        self.progress
            .error(self.origin, Some(&self.target), format!("{}: {}", what, error));
    }

    fn push_write(&mut self, write: PendingWrite) {
        self.pending.push(write);
    }

    /// Apply queued writes anchored at stack depth `depth` to `node`.
    fn flush(&mut self, depth: usize, node: &mut Node) {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|w| w.location.anchor == Anchor::Frame(depth));
        self.pending = waiting;
        for write in ready {
            if !write.apply(node) {
                self.report(
                    "special assignment",
                    EditError::Path(crate::path::PathError::NotAValue(format!("{:?}", write.location))),
                );
            }
        }
    }

    /// Writes left for catalog documents, in the order they were made.
    pub fn take_document_writes(&mut self) -> Vec<(NodeId, PendingWrite)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter_map(|w| match w.location.anchor {
                Anchor::Document(id) => Some((id, w)),
                Anchor::Frame(_) => None,
            })
            .collect()
    }
}

/// Apply `patch` to the node on top of `stack`, returning the edited copy.
pub fn modify_node(stack: &NodeStack<'_>, patch: &Node, ctx: &mut MergeContext<'_>) -> Node {
    let mut node = stack.node().clone();
    let depth = stack.depth();

    for value in &patch.values {
        match values::edit_value(stack, &mut node, value, ctx) {
            Ok(0) => debug!(key = %value.name, "no matching key"),
            Ok(n) => {
                for _ in 0..n {
                    ctx.progress.value_edited();
                }
            }
            Err(e) => ctx.report(&value.name, e),
        }
        ctx.flush(depth, &mut node);
    }

    for child in &patch.nodes {
        if child.name == PATCH_LOOP {
            continue;
        }
        match nodes::edit_child(stack, &mut node, child, ctx) {
            Ok(0) => debug!(node = %child.name, "no matching node"),
            Ok(n) => {
                for _ in 0..n {
                    ctx.progress.node_edited();
                }
            }
            Err(e) => ctx.report(&child.name, e),
        }
        ctx.flush(depth, &mut node);
    }

    node
}
