// SPDX-License-Identifier: AGPL-3.0-or-later
//
// External stamping-tool invocation.
//
// The tool is called once per document as `<tool> - stamp <watermark>
// output -`: the source document's raw bytes go to its stdin and the
// stamped PDF comes back on stdout. The operation is modelled as bounded
// request/response — write the full input buffer, then read the full output
// buffer. Reader threads drain stdout/stderr while the input is written so
// a large document cannot deadlock on a full pipe.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use stempel_core::config::{STAMP_TOOL_NAME, StampConfig};
use stempel_core::error::{InvocationFailure, Result, StempelError};
use stempel_core::lookup;

/// Poll interval while waiting on a deadline-bounded child.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Resolve the stamping tool for this run.
///
/// An explicitly configured `tool_path` wins; otherwise PATH is searched
/// for the well-known tool name. An unresolvable tool is reported once,
/// before any document is processed, because it affects every job
/// identically.
pub fn find_tool(config: &StampConfig) -> Result<PathBuf> {
    if let Some(configured) = &config.tool_path {
        if configured.is_file() {
            return Ok(configured.clone());
        }
        return Err(StempelError::ToolMissing {
            tool: configured.display().to_string(),
        });
    }
    lookup::find_in_path(STAMP_TOOL_NAME).ok_or_else(|| StempelError::ToolMissing {
        tool: STAMP_TOOL_NAME.to_string(),
    })
}

/// One resolved tool + watermark pairing, reused across every job in a
/// batch.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    tool: PathBuf,
    watermark: PathBuf,
    /// Per-invocation deadline; `None` means unbounded.
    timeout: Option<Duration>,
}

impl ToolInvoker {
    pub fn new(tool: PathBuf, watermark: PathBuf, timeout_secs: u64) -> Self {
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        Self {
            tool,
            watermark,
            timeout,
        }
    }

    /// The exact argument vector used for an invocation, kept for error
    /// reporting so a failure is reproducible outside the orchestrator.
    fn command_line(&self) -> Vec<String> {
        vec![
            self.tool.display().to_string(),
            "-".to_string(),
            "stamp".to_string(),
            self.watermark.display().to_string(),
            "output".to_string(),
            "-".to_string(),
        ]
    }

    /// Stamp one document: feed `document` to the tool's stdin and return
    /// the captured stdout bytes.
    ///
    /// Blocks until the subprocess exits or the configured deadline
    /// elapses. Never retries.
    #[instrument(skip_all, fields(tool = %self.tool.display(), bytes = document.len()))]
    pub fn invoke(&self, document: &[u8]) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.tool)
            .arg("-")
            .arg("stamp")
            .arg(&self.watermark)
            .arg("output")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(InvocationFailure::Launch(e.to_string())))?;

        // Drain both output pipes on their own threads before writing the
        // input, otherwise a tool producing more than a pipe buffer of
        // output would deadlock against our blocked write.
        let stdout_reader = spawn_drain(child.stdout.take());
        let stderr_reader = spawn_drain(child.stderr.take());

        let write_error = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(document).err(),
            None => None,
        };
        // stdin handle dropped here — the tool sees EOF.

        let status = self.wait_bounded(&mut child)?;

        let stdout = join_drain(stdout_reader);
        let stderr = join_drain(stderr_reader);

        if !status.success() {
            return Err(self.failure(InvocationFailure::Exit {
                code: status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            }));
        }
        if let Some(e) = write_error {
            // Exit 0 despite a failed input write means the tool cannot
            // have stamped the full document.
            return Err(self.failure(InvocationFailure::Launch(format!(
                "failed to write document to tool stdin: {e}"
            ))));
        }

        debug!(stamped_bytes = stdout.len(), "tool invocation succeeded");
        Ok(stdout)
    }

    /// Wait for the child, enforcing the configured deadline.
    fn wait_bounded(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return child
                .wait()
                .map_err(|e| self.failure(InvocationFailure::Launch(e.to_string())));
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        if let Err(e) = child.kill() {
                            warn!("failed to kill timed-out tool: {e}");
                        }
                        let _ = child.wait();
                        return Err(self.failure(InvocationFailure::Timeout {
                            secs: timeout.as_secs(),
                        }));
                    }
                    std::thread::sleep(WAIT_POLL);
                }
                Err(e) => {
                    return Err(self.failure(InvocationFailure::Launch(e.to_string())));
                }
            }
        }
    }

    fn failure(&self, failure: InvocationFailure) -> StempelError {
        StempelError::ToolInvocation {
            command: self.command_line(),
            failure,
        }
    }
}

/// Read a child pipe to completion on a background thread.
fn spawn_drain<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> Option<std::thread::JoinHandle<Vec<u8>>> {
    pipe.map(|mut r| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = r.read_to_end(&mut buf) {
                warn!("reading tool pipe failed: {e}");
            }
            buf
        })
    })
}

fn join_drain(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    match handle {
        Some(h) => h.join().unwrap_or_default(),
        None => Vec::new(),
    }
}
