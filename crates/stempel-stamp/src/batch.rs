// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Batch orchestration.
//
// Jobs run strictly sequentially, in the order supplied. A failed job is
// absorbed at its boundary — reported once, recorded, and the batch moves
// on — so one unreadable document never costs the rest of the run. Only the
// pre-batch checks (watermark source, tool resolution) abort everything,
// and those happen before this module is reached.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use stempel_core::error::StempelError;
use stempel_core::types::{DocumentJob, JobOutcome, JobStage};

use crate::invoker::ToolInvoker;
use crate::report::Reporter;
use crate::template::expand_template;

/// Outcome of a whole batch run.
#[derive(Debug)]
pub struct BatchResult {
    /// Per-job outcomes in document order.
    pub outcomes: Vec<JobOutcome>,
}

impl BatchResult {
    /// Whether any job failed. Drives the process exit signal.
    pub fn any_failed(&self) -> bool {
        self.outcomes.iter().any(|o| !o.is_success())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Stamp every document in `jobs`, writing results into `output_folder`.
///
/// Emits exactly one terminal message per job through `reporter`. Outputs
/// that pre-exist on disk are truncated; a collision *within* the batch
/// (two jobs expanding to the same output path) fails the later job instead
/// of silently destroying the earlier result.
#[instrument(skip_all, fields(jobs = jobs.len()))]
pub fn run_batch(
    jobs: Vec<DocumentJob>,
    invoker: &ToolInvoker,
    output_folder: &Path,
    template: &str,
    reporter: &mut dyn Reporter,
) -> BatchResult {
    let mut written: HashSet<PathBuf> = HashSet::new();
    let mut outcomes = Vec::with_capacity(jobs.len());

    for job in jobs {
        let outcome = process_job(job, invoker, output_folder, template, &mut written);
        match &outcome.result {
            Ok(path) => reporter.success(&outcome.job, path),
            Err(e) => reporter.failure(&outcome.job, e),
        }
        outcomes.push(outcome);
    }

    let result = BatchResult { outcomes };
    info!(
        succeeded = result.succeeded(),
        failed = result.failed(),
        "batch finished"
    );
    result
}

/// Run one job through the stage machine.
///
/// `ReadingSource → InvokingTool → ComputingOutputPath → WritingOutput`,
/// stopping at the first failing stage.
#[instrument(skip_all, fields(job_id = %job.id, source = %job.source.display()))]
fn process_job(
    job: DocumentJob,
    invoker: &ToolInvoker,
    output_folder: &Path,
    template: &str,
    written: &mut HashSet<PathBuf>,
) -> JobOutcome {
    // Reading the source up front doubles as the existence/permission
    // check; a missing document never reaches the tool.
    let document = match std::fs::read(&job.source) {
        Ok(bytes) => bytes,
        Err(source) => {
            return fail(
                job.clone(),
                JobStage::ReadingSource,
                StempelError::SourceAccess {
                    path: job.source.clone(),
                    source,
                },
            );
        }
    };
    debug!(bytes = document.len(), "source document read");

    let stamped = match invoker.invoke(&document) {
        Ok(bytes) => bytes,
        Err(e) => return fail(job, JobStage::InvokingTool, e),
    };

    let file_name = match expand_template(template, &job.stem, &job.suffix) {
        Ok(name) => name,
        Err(e) => return fail(job, JobStage::ComputingOutputPath, e),
    };
    let output_path = output_folder.join(file_name);

    if let Err(e) = write_output(&output_path, &stamped, written) {
        return fail(job, JobStage::WritingOutput, e);
    }

    info!(output = %output_path.display(), "document stamped");
    JobOutcome {
        job,
        stage: JobStage::Done,
        result: Ok(output_path),
    }
}

/// Terminal failure: record the stage the job died in.
fn fail(job: DocumentJob, stage: JobStage, error: StempelError) -> JobOutcome {
    warn!(job_id = %job.id, stage = %stage, "job failed: {error}");
    JobOutcome {
        job,
        stage,
        result: Err(error),
    }
}

/// Write the stamped bytes, guarding against intra-batch collisions and
/// half-written outputs.
fn write_output(
    path: &Path,
    stamped: &[u8],
    written: &mut HashSet<PathBuf>,
) -> Result<(), StempelError> {
    if !written.insert(path.to_path_buf()) {
        return Err(StempelError::OutputWrite {
            path: path.to_path_buf(),
            detail: "an earlier job in this batch already wrote this path".to_string(),
        });
    }

    // Stage into a sibling part-file and rename, so an interrupted write
    // never leaves a truncated output under the final name.
    let staging = staging_path(path);
    if let Err(e) = std::fs::write(&staging, stamped) {
        if let Err(cleanup) = std::fs::remove_file(&staging) {
            debug!(path = %staging.display(), "staging cleanup failed: {cleanup}");
        }
        written.remove(path);
        return Err(StempelError::OutputWrite {
            path: path.to_path_buf(),
            detail: e.to_string(),
        });
    }
    if let Err(e) = std::fs::rename(&staging, path) {
        if let Err(cleanup) = std::fs::remove_file(&staging) {
            warn!(path = %staging.display(), "staging cleanup failed: {cleanup}");
        }
        written.remove(path);
        return Err(StempelError::OutputWrite {
            path: path.to_path_buf(),
            detail: e.to_string(),
        });
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use stempel_core::error::InvocationFailure;

    /// Reporter capturing terminal messages for assertions.
    #[derive(Default)]
    struct RecordingReporter {
        events: Vec<Event>,
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Event {
        Success { stem: String, output: PathBuf },
        Failure { stem: String },
    }

    impl Reporter for RecordingReporter {
        fn info(&mut self, _message: &str) {}
        fn error(&mut self, _message: &str) {}

        fn success(&mut self, job: &DocumentJob, output: &Path) {
            self.events.push(Event::Success {
                stem: job.stem.clone(),
                output: output.to_path_buf(),
            });
        }

        fn failure(&mut self, job: &DocumentJob, _error: &StempelError) {
            self.events.push(Event::Failure {
                stem: job.stem.clone(),
            });
        }
    }

    /// Fake stamping tool: echoes stdin and appends a marker; refuses
    /// documents containing "BAD".
    #[cfg(unix)]
    fn fake_tool(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-pdftk");
        let script = r#"#!/bin/sh
input=$(cat)
case "$input" in
*BAD*)
    echo 'refusing bad document' >&2
    exit 1
    ;;
esac
printf '%sSTAMPED' "$input"
"#;
        std::fs::write(&path, script).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        path
    }

    #[cfg(unix)]
    fn invoker_for(dir: &Path) -> ToolInvoker {
        ToolInvoker::new(fake_tool(dir), dir.join("wm.pdf"), 30)
    }

    const TEMPLATE: &str = "${stem}_watermark${suffix}";

    #[test]
    #[cfg(unix)]
    fn one_missing_document_does_not_halt_the_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.pdf"), "aaa").expect("write");
        std::fs::write(dir.path().join("b.pdf"), "bbb").expect("write");

        let jobs = ["a.pdf", "missing.pdf", "b.pdf"]
            .iter()
            .map(|n| DocumentJob::new(dir.path().join(n)))
            .collect();

        let mut reporter = RecordingReporter::default();
        let result = run_batch(
            jobs,
            &invoker_for(dir.path()),
            out.path(),
            TEMPLATE,
            &mut reporter,
        );

        assert!(result.any_failed());
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 1);

        // Successes before and after the failure are preserved on disk.
        let a = std::fs::read(out.path().join("a_watermark.pdf")).expect("a output");
        assert_eq!(a, b"aaaSTAMPED");
        let b = std::fs::read(out.path().join("b_watermark.pdf")).expect("b output");
        assert_eq!(b, b"bbbSTAMPED");

        // Exactly one terminal message per job, in document order.
        assert_eq!(reporter.events.len(), 3);
        assert_eq!(
            reporter.events[0],
            Event::Success {
                stem: "a".into(),
                output: out.path().join("a_watermark.pdf"),
            }
        );
        assert_eq!(reporter.events[1], Event::Failure { stem: "missing".into() });
        assert_eq!(
            reporter.events[2],
            Event::Success {
                stem: "b".into(),
                output: out.path().join("b_watermark.pdf"),
            }
        );

        // The failed job carries the classified source-access error.
        let failed = &result.outcomes[1];
        assert_eq!(failed.stage, JobStage::ReadingSource);
        assert!(matches!(
            failed.result,
            Err(StempelError::SourceAccess { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn tool_rejection_fails_only_the_offending_job() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("good.pdf"), "fine").expect("write");
        std::fs::write(dir.path().join("broken.pdf"), "BAD content").expect("write");

        let jobs = ["good.pdf", "broken.pdf"]
            .iter()
            .map(|n| DocumentJob::new(dir.path().join(n)))
            .collect();

        let result = run_batch(
            jobs,
            &invoker_for(dir.path()),
            out.path(),
            TEMPLATE,
            &mut NullReporter,
        );

        assert_eq!(result.succeeded(), 1);
        let failed = &result.outcomes[1];
        assert_eq!(failed.stage, JobStage::InvokingTool);
        match &failed.result {
            Err(StempelError::ToolInvocation { failure, .. }) => match failure {
                InvocationFailure::Exit { code, stderr } => {
                    assert_eq!(*code, 1);
                    assert!(stderr.contains("refusing bad document"));
                }
                other => panic!("unexpected failure: {other}"),
            },
            other => panic!("unexpected result: {other:?}"),
        }
        // The rejected document left no output behind.
        assert!(!out.path().join("broken_watermark.pdf").exists());
    }

    #[test]
    #[cfg(unix)]
    fn unknown_placeholder_fails_jobs_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.pdf"), "aaa").expect("write");

        let jobs = vec![DocumentJob::new(dir.path().join("a.pdf"))];
        let result = run_batch(
            jobs,
            &invoker_for(dir.path()),
            out.path(),
            "${basename}_watermark${suffix}",
            &mut NullReporter,
        );

        assert_eq!(result.failed(), 1);
        assert_eq!(result.outcomes[0].stage, JobStage::ComputingOutputPath);
        assert!(matches!(
            result.outcomes[0].result,
            Err(StempelError::Template { .. })
        ));
        // No partial or garbage output path was created.
        assert_eq!(std::fs::read_dir(out.path()).expect("read dir").count(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn intra_batch_collision_fails_the_later_job() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("x");
        let second = dir.path().join("y");
        std::fs::create_dir_all(&first).expect("mkdir");
        std::fs::create_dir_all(&second).expect("mkdir");
        std::fs::write(first.join("report.pdf"), "first").expect("write");
        std::fs::write(second.join("report.pdf"), "second").expect("write");

        let jobs = vec![
            DocumentJob::new(first.join("report.pdf")),
            DocumentJob::new(second.join("report.pdf")),
        ];
        let result = run_batch(
            jobs,
            &invoker_for(dir.path()),
            out.path(),
            TEMPLATE,
            &mut NullReporter,
        );

        assert_eq!(result.succeeded(), 1);
        assert!(matches!(
            result.outcomes[1].result,
            Err(StempelError::OutputWrite { .. })
        ));
        // The earlier job's output survives untouched.
        let kept = std::fs::read(out.path().join("report_watermark.pdf")).expect("output");
        assert_eq!(kept, b"firstSTAMPED");
    }

    #[test]
    #[cfg(unix)]
    fn pre_existing_output_is_truncated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.pdf"), "new").expect("write");
        std::fs::write(out.path().join("a_watermark.pdf"), "stale earlier run")
            .expect("write");

        let jobs = vec![DocumentJob::new(dir.path().join("a.pdf"))];
        let result = run_batch(
            jobs,
            &invoker_for(dir.path()),
            out.path(),
            TEMPLATE,
            &mut NullReporter,
        );

        assert!(!result.any_failed());
        let content = std::fs::read(out.path().join("a_watermark.pdf")).expect("output");
        assert_eq!(content, b"newSTAMPED");
    }

    #[test]
    #[cfg(unix)]
    fn unwritable_output_folder_is_an_output_write_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.pdf"), "aaa").expect("write");
        // A regular file in place of the output folder fails the write
        // regardless of process privileges.
        let not_a_folder = dir.path().join("occupied");
        std::fs::write(&not_a_folder, "file").expect("write");

        let jobs = vec![DocumentJob::new(dir.path().join("a.pdf"))];
        let result = run_batch(
            jobs,
            &invoker_for(dir.path()),
            &not_a_folder,
            TEMPLATE,
            &mut NullReporter,
        );

        assert_eq!(result.failed(), 1);
        assert_eq!(result.outcomes[0].stage, JobStage::WritingOutput);
        assert!(matches!(
            result.outcomes[0].result,
            Err(StempelError::OutputWrite { .. })
        ));
    }
}
