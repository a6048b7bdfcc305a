// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Console front-end: renders pipeline messages as plain terminal lines.

use std::path::Path;

use stempel_core::StempelError;
use stempel_core::types::DocumentJob;
use stempel_stamp::Reporter;

#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn info(&mut self, message: &str) {
        println!("{message}");
    }

    fn error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn success(&mut self, job: &DocumentJob, output: &Path) {
        println!(
            "stamped {} -> {}",
            job.source.display(),
            output.display()
        );
    }

    fn failure(&mut self, job: &DocumentJob, error: &StempelError) {
        eprintln!("failed {}: {error}", job.source.display());
    }
}
