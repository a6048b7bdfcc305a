// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Stempelwerk — Document-processing pipeline.
//
// The pipeline is a pure pass-through orchestrator: it never parses or
// renders PDF content itself. Per document it reads the source bytes, pipes
// them through the external stamping tool, expands the output-path template,
// and writes the result, isolating failures to the job that raised them.

pub mod batch;
pub mod invoker;
pub mod report;
pub mod template;
pub mod watermark;

pub use batch::{BatchResult, run_batch};
pub use invoker::{ToolInvoker, find_tool};
pub use report::Reporter;
pub use template::expand_template;
pub use watermark::validate_watermark;
