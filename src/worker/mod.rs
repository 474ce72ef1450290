//! Background run
//!
//! Moves a whole run onto one worker thread so the host stays responsive.
//! The worker never logs directly: every event goes through an mpsc
//! channel to a drain thread, which hands it to the real sink. A panic on
//! the worker is fatal for the run and is not retried.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::apply::panic_message;
use crate::catalog::Catalog;
use crate::engine::{Engine, RunOutcome};
use crate::error::EngineError;
use crate::known::KnownIdentifiers;
use crate::progress::{ChannelSink, EventSink, PatchCounters, PatchEvent, Progress, TracingSink};

/// A run in progress on the worker thread.
pub struct RunHandle {
    counters: Arc<PatchCounters>,
    worker: JoinHandle<RunOutcome>,
    drain: JoinHandle<()>,
}

impl RunHandle {
    /// Live counters. Reads taken before [`RunHandle::wait`] returns are for display only.
    pub fn counters(&self) -> &Arc<PatchCounters> {
        &self.counters
    }

    pub fn status_line(&self) -> String {
        self.counters.snapshot().status_line()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Block until the run ends and every event has been drained.
    pub fn wait(self) -> Result<RunOutcome, EngineError> {
        let outcome = self
            .worker
            .join()
            .map_err(|payload| EngineError::WorkerPanicked(panic_message(payload.as_ref())));
        if self.drain.join().is_err() {
            debug!("event drain thread panicked");
        }
        outcome
    }
}

/// Start a run whose events are logged through `tracing`.
pub fn spawn_run(engine: Engine, catalog: Catalog, known: KnownIdentifiers) -> Result<RunHandle, EngineError> {
    spawn_run_with_sink(engine, catalog, known, TracingSink)
}

/// Start a run whose events are delivered to `sink` on the drain thread.
pub fn spawn_run_with_sink(
    engine: Engine,
    catalog: Catalog,
    known: KnownIdentifiers,
    sink: impl EventSink + 'static,
) -> Result<RunHandle, EngineError> {
    let (sender, receiver) = mpsc::channel::<PatchEvent>();

    let drain = thread::Builder::new()
        .name("confpatch-drain".to_string())
        .spawn(move || {
            for event in receiver {
                sink.emit(event);
            }
        })
        .map_err(EngineError::WorkerSpawn)?;

    let counters = Arc::new(PatchCounters::new());
    let progress = Progress::new(Arc::clone(&counters), Box::new(ChannelSink::new(sender)));

    // The sender lives in `progress`; when the worker ends it drops and the drain stops.
    let worker = thread::Builder::new()
        .name("confpatch-worker".to_string())
        .spawn(move || engine.run(catalog, &known, &progress))
        .map_err(EngineError::WorkerSpawn)?;

    Ok(RunHandle {
        counters,
        worker,
        drain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectSink, NullSink};
    use confpatch_tree::parse_document;

    #[test]
    fn test_background_run_delivers_events() {
        let catalog = Catalog::new().with_file(
            "a.cfg",
            "",
            parse_document("PART { name = p }\n@PART { @name = q }\n@PART[nope] { @x = 1 }\n@PART:NEEDS[Nope] {}")
                .unwrap(),
        );
        let sink = CollectSink::new();
        let handle = spawn_run_with_sink(Engine::default(), catalog, KnownIdentifiers::new(), sink.clone()).unwrap();
        let outcome = handle.wait().unwrap();

        assert_eq!(outcome.catalog.documents().next().unwrap().1.value("name"), Some("q"));
        assert_eq!(outcome.summary.counters.patches_applied, 1);
        let events = sink.events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PatchEvent::ApplyingEdit { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, PatchEvent::NeedsUnsatisfiedRoot { .. })));
    }

    #[test]
    fn test_counters_match_summary() {
        let catalog = Catalog::new().with_file(
            "a.cfg",
            "",
            parse_document("PART { a = 1 }\n@PART { @a += 1 }").unwrap(),
        );
        let handle = spawn_run_with_sink(Engine::default(), catalog, KnownIdentifiers::new(), NullSink).unwrap();
        let counters = Arc::clone(handle.counters());
        let outcome = handle.wait().unwrap();
        assert_eq!(counters.snapshot(), outcome.summary.counters);
        assert_eq!(
            counters.snapshot().status_line(),
            "Applied 1/1 patches (1 documents, 1 value edits, 0 node edits)"
        );
    }
}
