//! Run counters
//!
//! Counters only grow during a run and are written by the single worker
//! thread. Other threads may poll them for display; a poll taken mid-run
//! can be torn across counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct PatchCounters {
    patches_total: AtomicUsize,
    patches_applied: AtomicUsize,
    documents_patched: AtomicUsize,
    value_edits: AtomicUsize,
    node_edits: AtomicUsize,
    errors: AtomicUsize,
    exceptions: AtomicUsize,
    needs_unsatisfied: AtomicUsize,
    errors_by_file: Mutex<BTreeMap<String, usize>>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub patches_total: usize,
    pub patches_applied: usize,
    pub documents_patched: usize,
    pub value_edits: usize,
    pub node_edits: usize,
    pub errors: usize,
    pub exceptions: usize,
    pub needs_unsatisfied: usize,
}

impl PatchCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_patches(&self, n: usize) {
        self.patches_total.fetch_add(n, Ordering::Relaxed);
    }

    pub fn patch_applied(&self) {
        self.patches_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn document_patched(&self) {
        self.documents_patched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn value_edit(&self) {
        self.value_edits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn node_edit(&self) {
        self.node_edits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn needs_unsatisfied(&self) {
        self.needs_unsatisfied.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an error against the file it came from.
    pub fn error(&self, url: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.bump_file(url);
    }

    /// Count an exception against the file it came from.
    pub fn exception(&self, url: &str) {
        self.exceptions.fetch_add(1, Ordering::Relaxed);
        self.bump_file(url);
    }

    fn bump_file(&self, url: &str) {
        // A poisoned map only loses per-file attribution; totals are atomics.
        if let Ok(mut map) = self.errors_by_file.lock() {
            *map.entry(url.to_string()).or_insert(0) += 1;
        }
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn exceptions(&self) -> usize {
        self.exceptions.load(Ordering::Relaxed)
    }

    pub fn errors_by_file(&self) -> BTreeMap<String, usize> {
        self.errors_by_file
            .lock()
            .map(|map| map.clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            patches_total: self.patches_total.load(Ordering::Relaxed),
            patches_applied: self.patches_applied.load(Ordering::Relaxed),
            documents_patched: self.documents_patched.load(Ordering::Relaxed),
            value_edits: self.value_edits.load(Ordering::Relaxed),
            node_edits: self.node_edits.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            exceptions: self.exceptions.load(Ordering::Relaxed),
            needs_unsatisfied: self.needs_unsatisfied.load(Ordering::Relaxed),
        }
    }
}

impl CounterSnapshot {
    /// Human-readable progress line.
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "Applied {}/{} patches ({} documents, {} value edits, {} node edits)",
            self.patches_applied,
            self.patches_total,
            self.documents_patched,
            self.value_edits,
            self.node_edits
        );
        if self.needs_unsatisfied > 0 {
            line.push_str(&format!(", {} removed by :NEEDS", self.needs_unsatisfied));
        }
        if self.errors > 0 {
            line.push_str(&format!(", {} errors", self.errors));
        }
        if self.exceptions > 0 {
            line.push_str(&format!(", {} exceptions", self.exceptions));
        }
        line
    }

    pub fn has_failures(&self) -> bool {
        self.errors > 0 || self.exceptions > 0
    }
}
