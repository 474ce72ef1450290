//! Run progress: counters plus an event sink.
//!
//! Every engine stage reports through [`Progress`], which bumps the
//! matching counter and forwards a [`PatchEvent`] to the configured sink.

mod counters;
mod events;
mod sink;

pub use counters::{CounterSnapshot, PatchCounters};
pub use events::PatchEvent;
pub use sink::{ChannelSink, CollectSink, EventSink, NullSink, TracingSink};

use std::sync::Arc;

use crate::catalog::Origin;

pub struct Progress {
    counters: Arc<PatchCounters>,
    sink: Box<dyn EventSink>,
}

impl Progress {
    pub fn new(counters: Arc<PatchCounters>, sink: Box<dyn EventSink>) -> Self {
        Self { counters, sink }
    }

    /// Fresh counters, events logged through `tracing`.
    pub fn logging() -> Self {
        Self::new(Arc::new(PatchCounters::new()), Box::new(TracingSink))
    }

    /// Fresh counters, events sent to `sink`.
    pub fn with_sink(sink: impl EventSink + 'static) -> Self {
        Self::new(Arc::new(PatchCounters::new()), Box::new(sink))
    }

    pub fn counters(&self) -> &Arc<PatchCounters> {
        &self.counters
    }

    pub fn status_line(&self) -> String {
        self.counters.snapshot().status_line()
    }

    pub fn pass_started(&self, pass: &str, patches: usize) {
        self.sink.emit(PatchEvent::PassStarted {
            pass: pass.to_string(),
            patches,
        });
    }

    pub fn patches_extracted(&self, n: usize) {
        self.counters.add_patches(n);
    }

    pub fn patch_applied(&self) {
        self.counters.patch_applied();
    }

    pub fn value_edited(&self) {
        self.counters.value_edit();
    }

    pub fn node_edited(&self) {
        self.counters.node_edit();
    }

    pub fn applying_edit(&self, origin: &Origin, target: &Origin) {
        self.counters.document_patched();
        self.sink.emit(PatchEvent::ApplyingEdit {
            origin: origin.clone(),
            target: target.clone(),
        });
    }

    pub fn applying_copy(&self, origin: &Origin, target: &Origin) {
        self.counters.document_patched();
        self.sink.emit(PatchEvent::ApplyingCopy {
            origin: origin.clone(),
            target: target.clone(),
        });
    }

    pub fn applying_delete(&self, origin: &Origin, target: &Origin) {
        self.counters.document_patched();
        self.sink.emit(PatchEvent::ApplyingDelete {
            origin: origin.clone(),
            target: target.clone(),
        });
    }

    pub fn patch_loop(&self, origin: &Origin, target: &Origin, iteration: usize) {
        self.sink.emit(PatchEvent::PatchLoop {
            origin: origin.clone(),
            target: target.clone(),
            iteration,
        });
    }

    pub fn needs_unsatisfied_root(&self, origin: &Origin) {
        self.counters.needs_unsatisfied();
        self.sink.emit(PatchEvent::NeedsUnsatisfiedRoot {
            origin: origin.clone(),
        });
    }

    pub fn needs_unsatisfied_node(&self, origin: &Origin, path: String) {
        self.counters.needs_unsatisfied();
        self.sink.emit(PatchEvent::NeedsUnsatisfiedNode {
            origin: origin.clone(),
            path,
        });
    }

    pub fn needs_unsatisfied_value(&self, origin: &Origin, path: String) {
        self.counters.needs_unsatisfied();
        self.sink.emit(PatchEvent::NeedsUnsatisfiedValue {
            origin: origin.clone(),
            path,
        });
    }

    pub fn needs_unsatisfied_pass(&self, origin: &Origin, pass: String) {
        self.counters.needs_unsatisfied();
        self.sink.emit(PatchEvent::NeedsUnsatisfiedPass {
            origin: origin.clone(),
            pass,
        });
    }

    pub fn warning(&self, origin: &Origin, message: impl Into<String>) {
        self.sink.emit(PatchEvent::Warning {
            origin: origin.clone(),
            message: message.into(),
        });
    }

    pub fn error(&self, origin: &Origin, target: Option<&Origin>, message: impl Into<String>) {
        self.counters.error(&origin.url);
        self.sink.emit(PatchEvent::Error {
            origin: origin.clone(),
            target: target.cloned(),
            message: message.into(),
        });
    }

    pub fn exception(&self, origin: &Origin, message: impl Into<String>, patch: String) {
        self.counters.exception(&origin.url);
        self.sink.emit(PatchEvent::Exception {
            origin: origin.clone(),
            message: message.into(),
            patch,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_and_forwards() {
        let sink = CollectSink::new();
        let progress = Progress::with_sink(sink.clone());
        let origin = Origin::new("a.cfg", "@PART[x]");
        let target = Origin::new("b.cfg", "PART");

        progress.applying_edit(&origin, &target);
        progress.error(&origin, Some(&target), "no such key");
        progress.needs_unsatisfied_root(&origin);

        let snap = progress.counters().snapshot();
        assert_eq!(snap.documents_patched, 1);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.needs_unsatisfied, 1);

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(events[1].is_failure());
        assert_eq!(events[2].origin(), Some(&origin));
    }
}
