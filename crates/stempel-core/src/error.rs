// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Unified error types for Stempelwerk.
//
// The taxonomy is closed: every failure in the pipeline maps onto exactly
// one of these variants, and each variant carries structured fields (path,
// argument vector, captured diagnostics) so front-ends can render them
// without re-parsing message text. Run-level variants abort the whole run;
// job-level variants are caught at the job boundary and the batch continues.

use std::path::PathBuf;

use thiserror::Error;

/// How a tool invocation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationFailure {
    /// The subprocess could not even be launched (vanished binary,
    /// permission denied, ...).
    Launch(String),
    /// The tool ran but exited non-zero. `stderr` holds its captured
    /// diagnostic output verbatim.
    Exit { code: i32, stderr: String },
    /// The tool exceeded the configured deadline and was killed.
    Timeout { secs: u64 },
}

impl std::fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Launch(detail) => write!(f, "failed to launch: {detail}"),
            Self::Exit { code, stderr } => {
                write!(f, "exited with status {code}: {}", stderr.trim())
            }
            Self::Timeout { secs } => write!(f, "killed after {secs}s timeout"),
        }
    }
}

/// Top-level error type for all Stempelwerk operations.
#[derive(Debug, Error)]
pub enum StempelError {
    // -- Run-level (fatal before any document is processed) --
    #[error("malformed configuration override {path}: {detail}")]
    Config { path: PathBuf, detail: String },

    #[error("stamping tool '{tool}' is not installed or not on PATH")]
    ToolMissing { tool: String },

    #[error("watermark source {path} is not readable: {source}")]
    WatermarkSource {
        path: PathBuf,
        source: std::io::Error,
    },

    // -- Job-level (scoped to one document, batch continues) --
    #[error("cannot read source document {path}: {source}")]
    SourceAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stamping tool invocation `{}` {failure}", .command.join(" "))]
    ToolInvocation {
        /// The exact argument vector used, so the failure is reproducible
        /// outside the orchestrator.
        command: Vec<String>,
        failure: InvocationFailure,
    },

    #[error("output template {template:?} references unknown placeholder '{placeholder}'")]
    Template {
        template: String,
        placeholder: String,
    },

    #[error("cannot write output {path}: {detail}")]
    OutputWrite { path: PathBuf, detail: String },
}

impl StempelError {
    /// Whether this error aborts the entire run (as opposed to failing a
    /// single document job).
    pub fn is_run_level(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::ToolMissing { .. } | Self::WatermarkSource { .. }
        )
    }

    /// Process exit status for a run-level error. Job-level errors do not
    /// terminate the process and map to the generic failure status `1`,
    /// applied by the batch driver when any job failed.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::ToolMissing { .. } => 3,
            Self::WatermarkSource { .. } => 4,
            _ => 1,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StempelError>;
