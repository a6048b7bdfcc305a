// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Command-line surface.

use std::path::PathBuf;

use clap::Parser;

use stempel_core::StampConfig;

/// Stamp PDF documents with a watermark overlay
#[derive(Parser, Debug)]
#[command(
    name = "stempelwerk",
    version,
    about = "Apply a watermark overlay to one or more PDF documents",
    long_about = "Takes one or more PDF documents and overlays every page with a \
                  watermark PDF, delegating the stamping to the external `pdftk` \
                  tool. Built-in defaults can be overridden with a local \
                  configuration file; `--dump-config` prints the effective \
                  configuration in exactly that format."
)]
pub struct Cli {
    /// PDF documents to stamp
    #[arg(value_name = "FILE")]
    pub documents: Vec<PathBuf>,

    /// Single-page PDF used as the watermark overlay
    #[arg(short, long, value_name = "FILE")]
    pub watermark: Option<PathBuf>,

    /// Folder the stamped documents are written into
    #[arg(short, long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Output file-name template; `${stem}` and `${suffix}` expand per document
    #[arg(short, long, value_name = "TEMPLATE")]
    pub template: Option<String>,

    /// Launch the graphical file-picker flow instead of reading positionals
    #[arg(long)]
    pub launch_gui: bool,

    /// Print the fully-resolved configuration as JSON and exit
    #[arg(long)]
    pub dump_config: bool,
}

impl Cli {
    /// Overlay the command-line flags onto the resolved configuration.
    ///
    /// Flags sit above the override file in the layering: they shadow
    /// whatever the file (or the defaults) provided.
    pub fn apply_to(&self, mut config: StampConfig) -> StampConfig {
        if let Some(watermark) = &self.watermark {
            config.watermark_pdf = watermark.clone();
        }
        if let Some(out_dir) = &self.out_dir {
            config.output_folder = out_dir.clone();
        }
        if let Some(template) = &self.template {
            config.output_template = template.clone();
        }
        config
    }
}
