//! Run summary (run_summary.json)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::extract::PassReport;
use crate::progress::CounterSnapshot;

/// Schema version for run_summary.json
pub const RUN_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for run_summary.json
pub const RUN_SUMMARY_SCHEMA_ID: &str = "confpatch/run_summary@1";

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Every patch applied without error
    Success,
    /// The run finished but recorded errors or exceptions
    CompletedWithErrors,
}

/// Stable process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// Bad configuration or unreadable input
    Config = 1,
    /// Run completed with recorded errors
    CompletedWithErrors = 2,
    /// Worker fault; the run produced no result
    Fatal = 3,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Status {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Status::Success => ExitCode::Success,
            Status::CompletedWithErrors => ExitCode::CompletedWithErrors,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub schema_id: String,

    /// Run identifier (ULID)
    pub run_id: String,

    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,

    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,

    pub status: Status,
    pub exit_code: i32,

    /// Final counter values
    pub counters: CounterSnapshot,

    /// Error and exception counts per originating file
    pub errors_by_file: BTreeMap<String, usize>,

    /// Passes that held patches, in execution order
    pub passes: Vec<PassReport>,

    /// Documents left in the catalog
    pub documents: usize,

    pub human_summary: String,
}

impl RunSummary {
    pub fn new(
        run_id: String,
        started_at: DateTime<Utc>,
        counters: CounterSnapshot,
        errors_by_file: BTreeMap<String, usize>,
        passes: Vec<PassReport>,
        documents: usize,
    ) -> Self {
        let created_at = Utc::now();
        let duration_ms = (created_at - started_at).num_milliseconds().max(0) as u64;
        let status = if counters.has_failures() {
            Status::CompletedWithErrors
        } else {
            Status::Success
        };
        let human_summary = Self::generate_human_summary(status, &counters);

        Self {
            schema_version: RUN_SUMMARY_SCHEMA_VERSION,
            schema_id: RUN_SUMMARY_SCHEMA_ID.to_string(),
            run_id,
            started_at,
            created_at,
            duration_ms,
            status,
            exit_code: status.exit_code().as_i32(),
            counters,
            errors_by_file,
            passes,
            documents,
            human_summary,
        }
    }

    fn generate_human_summary(status: Status, counters: &CounterSnapshot) -> String {
        match status {
            Status::Success => format!("Run succeeded: {}", counters.status_line()),
            Status::CompletedWithErrors => format!(
                "Run completed with {} error(s) and {} exception(s): {}",
                counters.errors,
                counters.exceptions,
                counters.status_line()
            ),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }
}
