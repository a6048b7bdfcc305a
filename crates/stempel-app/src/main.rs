// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Stempelwerk — Batch PDF watermark stamper.
//
// Entry point. Initialises logging, resolves the layered configuration,
// picks the front-end (console or dialog flow), and drives the stamping
// pipeline. Exit status: 0 on full success or help display, 1 when any
// document job failed, 2/3/4 for configuration, missing-tool, and
// watermark-source errors respectively.

mod cli;
mod console;
mod gui;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::{error, info};

use stempel_core::{DocumentJob, StampConfig, StempelError};
use stempel_stamp::{Reporter, ToolInvoker, find_tool, run_batch, validate_watermark};

use cli::Cli;
use console::ConsoleReporter;
use gui::DialogReporter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // No documents and no graphical mode requested: show usage and leave
    // with a non-error status.
    if cli.documents.is_empty() && !cli.launch_gui && !cli.dump_config {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    }

    let config = match StampConfig::resolve_default() {
        Ok(config) => cli.apply_to(config),
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            return exit_for(&e);
        }
    };

    if cli.dump_config {
        // Printed in the same format accepted as a local override, so the
        // output can be redirected to create one.
        println!("{}", config.dump());
        return ExitCode::SUCCESS;
    }

    if cli.launch_gui {
        let documents = gui::pick_documents(&config).unwrap_or_default();
        run_pipeline(&config, documents, &mut DialogReporter)
    } else {
        run_pipeline(&config, cli.documents.clone(), &mut ConsoleReporter)
    }
}

/// Drive the full pipeline for one run: pre-batch checks, then the batch.
///
/// An empty document list (including a cancelled picker) is an aborted
/// run, not an error.
fn run_pipeline(
    config: &StampConfig,
    documents: Vec<PathBuf>,
    reporter: &mut dyn Reporter,
) -> ExitCode {
    if documents.is_empty() {
        reporter.info("No documents supplied, nothing to do.");
        return ExitCode::SUCCESS;
    }

    // Both checks gate the entire run: they affect every job identically
    // and are reported once, never per document.
    let tool = match find_tool(config) {
        Ok(tool) => tool,
        Err(e) => return abort(reporter, e),
    };
    if let Err(e) = validate_watermark(&config.watermark_pdf) {
        return abort(reporter, e);
    }

    info!(
        tool = %tool.display(),
        watermark = %config.watermark_pdf.display(),
        documents = documents.len(),
        "starting batch"
    );

    let invoker = ToolInvoker::new(
        tool,
        config.watermark_pdf.clone(),
        config.tool_timeout_secs,
    );
    let jobs: Vec<DocumentJob> = documents.into_iter().map(DocumentJob::new).collect();
    let result = run_batch(
        jobs,
        &invoker,
        &config.output_folder,
        &config.output_template,
        reporter,
    );

    if result.any_failed() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Report a run-level error and map it to its exit status.
fn abort(reporter: &mut dyn Reporter, e: StempelError) -> ExitCode {
    error!("{e}");
    reporter.error(&e.to_string());
    exit_for(&e)
}

fn exit_for(e: &StempelError) -> ExitCode {
    ExitCode::from(e.exit_code() as u8)
}
