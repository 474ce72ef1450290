//! Run-level errors
//!
//! Anything here ends the run. Errors confined to one patch or one edit
//! are reported through [`crate::progress::Progress`] instead.

use std::io;
use std::path::PathBuf;

use confpatch_tree::CodecError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("patch worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("failed to start patch worker: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Worker faults leave no usable result and must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::WorkerPanicked(_) | EngineError::WorkerSpawn(_))
    }
}
