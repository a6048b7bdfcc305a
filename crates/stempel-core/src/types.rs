// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Core domain types for the Stempelwerk watermark stamper.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StempelError;

/// Unique identifier for a document job, carried through tracing spans and
/// terminal messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stages a document job moves through.
///
/// The happy path runs top to bottom; a failure in any non-terminal stage
/// moves the job to the absorbing `Failed` outcome with that stage recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStage {
    /// Queued, nothing done yet.
    Pending,
    /// Reading the source document bytes (doubles as the existence and
    /// permission check).
    ReadingSource,
    /// Subprocess call to the external stamping tool.
    InvokingTool,
    /// Expanding the output-path template.
    ComputingOutputPath,
    /// Writing the stamped bytes to the destination.
    WritingOutput,
    /// Output file written, success message emitted.
    Done,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::ReadingSource => "reading source",
            Self::InvokingTool => "invoking tool",
            Self::ComputingOutputPath => "computing output path",
            Self::WritingOutput => "writing output",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// One input document to be stamped.
///
/// Created per entry in the document list and consumed exactly once by the
/// batch orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    pub id: JobId,
    /// Path of the source document as supplied by the front-end.
    pub source: PathBuf,
    /// File name without its extension.
    pub stem: String,
    /// Extension including the leading dot, or empty when the file name
    /// has none.
    pub suffix: String,
}

impl DocumentJob {
    /// Build a job from a source path, deriving the template substitution
    /// values from its file name.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let (stem, suffix) = split_file_name(&source);
        Self {
            id: JobId::new(),
            source,
            stem,
            suffix,
        }
    }
}

/// Split a path's file name into (stem, suffix-with-dot).
fn split_file_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, suffix)
}

/// Terminal result of one document job.
#[derive(Debug)]
pub struct JobOutcome {
    pub job: DocumentJob,
    /// Stage the job had reached when it finished or failed.
    pub stage: JobStage,
    /// The written output path on success, the classified error on failure.
    pub result: Result<PathBuf, StempelError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
