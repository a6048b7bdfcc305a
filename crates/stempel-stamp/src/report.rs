// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Reporter seam between the pipeline and whichever front-end is active.
//
// The pipeline emits plain-text messages only; rendering (console lines or
// message dialogs) is the front-end's concern. Each document job produces
// exactly one terminal message, success or failure.

use std::path::Path;

use stempel_core::error::StempelError;
use stempel_core::types::DocumentJob;

/// Sink for user-visible pipeline messages.
pub trait Reporter {
    /// Informational, non-error condition (defaults in use, run summary).
    fn info(&mut self, message: &str);

    /// Run-level error that is not scoped to a single job (tool missing,
    /// watermark source unreadable).
    fn error(&mut self, message: &str);

    /// Terminal success message for one job.
    fn success(&mut self, job: &DocumentJob, output: &Path);

    /// Terminal failure message for one job.
    fn failure(&mut self, job: &DocumentJob, error: &StempelError);
}

/// Reporter that discards everything. Used where the caller only cares
/// about the returned outcomes.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn info(&mut self, _message: &str) {}
    fn error(&mut self, _message: &str) {}
    fn success(&mut self, _job: &DocumentJob, _output: &Path) {}
    fn failure(&mut self, _job: &DocumentJob, _error: &StempelError) {}
}
