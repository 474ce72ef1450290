//! Pass scheduler
//!
//! Runs every pass in order. Each patch scans the documents present in the
//! catalog and applies itself to every structural match. A panic while one
//! patch is applied abandons that patch only.

use std::panic::{self, AssertUnwindSafe};

use confpatch_pattern::Command;
use confpatch_tree::{Node, NodeId};
use tracing::{debug, info};

use crate::catalog::{Catalog, DocumentRef, Origin};
use crate::extract::{Patch, PatchList};
use crate::merge::{modify_node, MergeContext, PendingWrite};
use crate::path::NodeStack;
use crate::progress::Progress;

/// Apply every pass of `list` to `catalog`, then purge leftover patch documents.
pub fn apply_patches(catalog: &mut Catalog, list: &PatchList, max_loop: usize, progress: &Progress) {
    for pass in list.passes() {
        if pass.patches.is_empty() {
            continue;
        }
        info!(pass = %pass.name, patches = pass.patches.len(), "starting pass");
        progress.pass_started(&pass.name, pass.patches.len());

        for patch in &pass.patches {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                apply_patch(catalog, patch, max_loop, progress)
            }));
            match outcome {
                Ok(true) => progress.patch_applied(),
                Ok(false) => debug!(patch = %patch.origin, "patch matched nothing"),
                Err(payload) => {
                    progress.exception(&patch.origin, panic_message(payload.as_ref()), patch.node.to_string())
                }
            }
        }
    }

    let purged = catalog.retain_documents(|file, node| {
        let keep = Command::parse(&node.name).0 == Command::Insert;
        if !keep {
            progress.warning(
                &Origin::new(&file.url, &node.name),
                "removing document left with a patch command",
            );
        }
        keep
    });
    if purged > 0 {
        debug!(purged, "purged leftover patch documents");
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Apply one patch to every matching document. Returns true if anything matched.
fn apply_patch(catalog: &mut Catalog, patch: &Patch, max_loop: usize, progress: &Progress) -> bool {
    let mut matched = false;
    for file in 0..catalog.file_count() {
        matched |= match patch.command {
            Command::Edit => edit_file(catalog, file, patch, max_loop, progress),
            Command::Copy => copy_file(catalog, file, patch, progress),
            Command::Delete => delete_file(catalog, file, patch, progress),
            _ => false,
        };
    }
    matched
}

fn matches_at(catalog: &Catalog, at: DocumentRef, patch: &Patch) -> bool {
    catalog
        .document(at)
        .map_or(false, |node| patch.matcher.is_match(node))
}

/// Merge the patch body onto the document at `at` without touching the catalog.
fn merge_document(
    catalog: &Catalog,
    at: DocumentRef,
    patch: &Patch,
    target: &Origin,
    progress: &Progress,
) -> Option<(Node, Vec<(NodeId, PendingWrite)>)> {
    let document = catalog.document(at)?;
    let stack = NodeStack::root(document);
    let mut ctx = MergeContext::new(catalog, progress, &patch.origin, target.clone());
    let merged = modify_node(&stack, &patch.node, &mut ctx);
    Some((merged, ctx.take_document_writes()))
}

fn write_documents(
    catalog: &mut Catalog,
    writes: Vec<(NodeId, PendingWrite)>,
    patch: &Patch,
    target: &Origin,
    progress: &Progress,
) {
    for (id, write) in writes {
        let applied = catalog
            .find_by_id(id)
            .and_then(|at| catalog.document_mut(at))
            .map_or(false, |node| write.apply(node));
        if !applied {
            progress.error(
                &patch.origin,
                Some(target),
                "special assignment target no longer exists",
            );
        }
    }
}

fn edit_file(catalog: &mut Catalog, file: usize, patch: &Patch, max_loop: usize, progress: &Progress) -> bool {
    let mut matched = false;
    for index in 0..catalog.documents_in(file) {
        let at = DocumentRef { file, index };
        if !matches_at(catalog, at, patch) {
            continue;
        }
        let target = match catalog.origin(at) {
            Some(target) => target,
            None => continue,
        };
        matched = true;
        progress.applying_edit(&patch.origin, &target);

        let mut iteration = 0;
        loop {
            let (merged, writes) = match merge_document(catalog, at, patch, &target, progress) {
                Some(result) => result,
                None => break,
            };
            if let Some(document) = catalog.document_mut(at) {
                *document = merged;
            }
            write_documents(catalog, writes, patch, &target, progress);

            if !patch.looping || !matches_at(catalog, at, patch) {
                break;
            }
            iteration += 1;
            if iteration >= max_loop {
                progress.error(
                    &patch.origin,
                    Some(&target),
                    format!("patch loop stopped after {} iterations", iteration),
                );
                break;
            }
            progress.patch_loop(&patch.origin, &target, iteration);
        }
    }
    matched
}

fn copy_file(catalog: &mut Catalog, file: usize, patch: &Patch, progress: &Progress) -> bool {
    let mut matched = false;
    // Copies land at the end of the file; only the original documents are scanned.
    for index in 0..catalog.documents_in(file) {
        let at = DocumentRef { file, index };
        if !matches_at(catalog, at, patch) {
            continue;
        }
        let target = match catalog.origin(at) {
            Some(target) => target,
            None => continue,
        };
        matched = true;
        progress.applying_copy(&patch.origin, &target);

        let (copy, writes) = match merge_document(catalog, at, patch, &target, progress) {
            Some(result) => result,
            None => continue,
        };
        let same_name = catalog
            .document(at)
            .map_or(false, |original| original.value("name") == copy.value("name"));
        if same_name {
            progress.error(
                &patch.origin,
                Some(&target),
                "copy needs to have a different name than the original",
            );
            continue;
        }
        catalog.add_document(file, copy.fork());
        write_documents(catalog, writes, patch, &target, progress);
    }
    matched
}

fn delete_file(catalog: &mut Catalog, file: usize, patch: &Patch, progress: &Progress) -> bool {
    let doomed: Vec<DocumentRef> = (0..catalog.documents_in(file))
        .map(|index| DocumentRef { file, index })
        .filter(|&at| matches_at(catalog, at, patch))
        .collect();
    for &at in doomed.iter().rev() {
        if let Some(target) = catalog.origin(at) {
            progress.applying_delete(&patch.origin, &target);
        }
        catalog.remove_document(at);
    }
    !doomed.is_empty()
}
