// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Watermark-source validation.

use std::path::Path;

use tracing::debug;

use stempel_core::error::{Result, StempelError};

/// Check that the watermark overlay exists and is readable.
///
/// Runs exactly once per run, before the batch loop: a bad overlay affects
/// every job identically, so it aborts the whole run instead of failing
/// document by document. The file is opened read-only purely as a probe and
/// closed again; its content is never inspected here.
pub fn validate_watermark(path: &Path) -> Result<()> {
    match std::fs::File::open(path) {
        Ok(file) => {
            let is_file = file
                .metadata()
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                return Err(StempelError::WatermarkSource {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "not a regular file",
                    ),
                });
            }
            debug!(path = %path.display(), "watermark source validated");
            Ok(())
        }
        Err(source) => Err(StempelError::WatermarkSource {
            path: path.to_path_buf(),
            source,
        }),
    }
}
