//! confpatch - declarative patch engine for configuration document trees
//!
//! A run takes a [`Catalog`] of root documents, removes the ones whose
//! `:NEEDS[...]` cannot be met, pulls out every patch document, and applies
//! the patches pass by pass. The result is the patched catalog plus a
//! [`RunSummary`].
//!
//! The node model and text format live in `confpatch-tree`; the name
//! grammar (commands, selectors, pass specifiers) lives in
//! `confpatch-pattern`.

pub mod apply;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod host;
pub mod known;
pub mod merge;
pub mod needs;
pub mod path;
pub mod progress;
pub mod summary;
pub mod worker;

pub use catalog::{Catalog, CatalogFile, DocumentRef, Origin};
pub use config::{ConfigError, EffectiveConfig, EngineConfig};
pub use engine::{Engine, RunOutcome};
pub use error::EngineError;
pub use extract::{PassReport, PatchList};
pub use known::KnownIdentifiers;
pub use progress::{CounterSnapshot, EventSink, PatchCounters, PatchEvent, Progress};
pub use summary::{ExitCode, RunSummary, Status};
pub use worker::{spawn_run, spawn_run_with_sink, RunHandle};
