// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Graphical front-end: a minimal dialog flow around the same pipeline the
// CLI drives.
//
// The flow is intro dialog → multi-file picker → batch run with results
// rendered as message dialogs. Cancelling any dialog is treated exactly
// like supplying no documents — an aborted run, not an error. When a
// `gui_tool_path` is configured the file picker is delegated to that
// external dialog tool (zenity-compatible); otherwise native dialogs are
// used.

use std::path::{Path, PathBuf};
use std::process::Command;

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tracing::{debug, info, warn};

use stempel_core::StampConfig;
use stempel_core::StempelError;
use stempel_core::types::DocumentJob;
use stempel_stamp::Reporter;

const APP_TITLE: &str = "Stempelwerk";

const INTRO_TEXT: &str = "This applies the watermark overlay to the PDF files you \
    pick in the next dialog. Each stamped file is saved into the configured \
    output folder under its templated name.";

/// Ask for the documents to stamp.
///
/// Returns `None` when the user cancels anywhere, which the caller treats
/// the same as an empty document list.
pub fn pick_documents(config: &StampConfig) -> Option<Vec<PathBuf>> {
    let proceed = MessageDialog::new()
        .set_title(APP_TITLE)
        .set_level(MessageLevel::Info)
        .set_description(INTRO_TEXT)
        .set_buttons(MessageButtons::OkCancel)
        .show();
    if proceed != MessageDialogResult::Ok {
        info!("user cancelled at the intro dialog");
        return None;
    }

    match &config.gui_tool_path {
        Some(tool) => pick_with_external_tool(tool),
        None => pick_native(),
    }
}

fn pick_native() -> Option<Vec<PathBuf>> {
    let files = FileDialog::new()
        .set_title("Select PDF documents to stamp")
        .add_filter("PDF", &["pdf"])
        .pick_files()?;
    debug!(count = files.len(), "documents picked");
    Some(files)
}

/// Delegate picking to an external dialog tool (zenity-compatible): the
/// tool prints the selected paths `|`-separated on stdout and exits
/// non-zero on cancel.
fn pick_with_external_tool(tool: &Path) -> Option<Vec<PathBuf>> {
    let output = match Command::new(tool)
        .args(["--file-selection", "--multiple", "--file-filter=*.pdf"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            warn!(tool = %tool.display(), "external picker failed to launch: {e}");
            return None;
        }
    };
    if !output.status.success() {
        info!("external picker cancelled");
        return None;
    }
    let picked = parse_picker_output(&String::from_utf8_lossy(&output.stdout));
    debug!(count = picked.len(), "documents picked via external tool");
    Some(picked)
}

/// Parse the `|`-separated, newline-terminated path list a zenity-style
/// file selection prints.
fn parse_picker_output(raw: &str) -> Vec<PathBuf> {
    raw.trim_end_matches(['\n', '\r'])
        .split('|')
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Front-end that renders every pipeline message as a dialog.
#[derive(Debug, Default)]
pub struct DialogReporter;

impl DialogReporter {
    fn show(&self, level: MessageLevel, text: &str) {
        MessageDialog::new()
            .set_title(APP_TITLE)
            .set_level(level)
            .set_description(text)
            .show();
    }
}

impl Reporter for DialogReporter {
    fn info(&mut self, message: &str) {
        self.show(MessageLevel::Info, message);
    }

    fn error(&mut self, message: &str) {
        self.show(MessageLevel::Error, message);
    }

    fn success(&mut self, job: &DocumentJob, output: &Path) {
        self.show(
            MessageLevel::Info,
            &format!(
                "{} was stamped and saved as\n{}",
                job.source.display(),
                output.display()
            ),
        );
    }

    fn failure(&mut self, job: &DocumentJob, error: &StempelError) {
        self.show(
            MessageLevel::Error,
            &format!("{} could not be stamped:\n{error}", job.source.display()),
        );
    }
}
