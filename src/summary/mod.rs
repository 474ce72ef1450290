//! Run summary and exit codes

mod run_summary;

pub use run_summary::{ExitCode, RunSummary, Status, RUN_SUMMARY_SCHEMA_ID, RUN_SUMMARY_SCHEMA_VERSION};
