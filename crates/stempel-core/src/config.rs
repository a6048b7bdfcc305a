// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Layered configuration: built-in defaults overlaid with an optional local
// JSON override file.
//
// Overrides shadow defaults key-by-key, never wholesale: a file that sets
// only `output_template` keeps every other default. A missing, unreadable,
// or empty override is informational; malformed content is fatal so the run
// never proceeds with a possibly-intended-but-broken configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, StempelError};
use crate::lookup;

/// Default file name of the watermark overlay, looked up next to the
/// installed binary.
const DEFAULT_WATERMARK_FILE: &str = "fs_watermark.pdf";

/// Default output-path template. `${stem}` is the source file name without
/// its extension, `${suffix}` the extension including the leading dot.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "${stem}_watermark${suffix}";

/// Name of the external stamping tool searched on PATH when `tool_path`
/// is not configured.
pub const STAMP_TOOL_NAME: &str = "pdftk";

/// Default bound on a single tool invocation, in seconds. `0` disables
/// the bound.
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// Fully-resolved application settings.
///
/// Built once at process start and immutable thereafter; every consumer
/// receives it by parameter, no component reads ambient global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampConfig {
    /// Folder stamped documents are written into.
    pub output_folder: PathBuf,
    /// The single-page overlay document applied to every page.
    pub watermark_pdf: PathBuf,
    /// Explicit path to the stamping tool; when absent the tool is
    /// searched on PATH.
    pub tool_path: Option<PathBuf>,
    /// Optional external dialog tool used for graphical file picking
    /// instead of the native dialogs.
    pub gui_tool_path: Option<PathBuf>,
    /// Template expanded per document to form the output file name.
    pub output_template: String,
    /// Deadline for one tool invocation in seconds (`0` = unbounded).
    pub tool_timeout_secs: u64,
}

impl StampConfig {
    /// Built-in defaults, with paths resolved relative to the given
    /// installation directory.
    pub fn defaults_at(install_dir: &Path) -> Self {
        Self {
            output_folder: install_dir.to_path_buf(),
            watermark_pdf: install_dir.join(DEFAULT_WATERMARK_FILE),
            tool_path: None,
            gui_tool_path: None,
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }

    /// Resolve the effective configuration: defaults overlaid with the
    /// override file at `override_path`, if one exists.
    ///
    /// A missing or unreadable override file and an override that parses to
    /// an empty key-set both yield the defaults unmodified. Malformed
    /// content is a fatal [`StempelError::Config`].
    pub fn resolve(defaults: Self, override_path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(override_path) {
            Ok(raw) => raw,
            Err(e) => {
                info!(
                    path = %override_path.display(),
                    "no configuration override ({e}), using built-in defaults"
                );
                return Ok(defaults);
            }
        };

        let overrides: ConfigOverride =
            serde_json::from_str(&raw).map_err(|e| StempelError::Config {
                path: override_path.to_path_buf(),
                detail: e.to_string(),
            })?;

        if overrides.is_empty() {
            info!(
                path = %override_path.display(),
                "configuration override is empty, using built-in defaults"
            );
            return Ok(defaults);
        }

        debug!(path = %override_path.display(), "applying configuration override");
        Ok(overrides.apply(defaults))
    }

    /// Resolve from the conventional locations: defaults next to the
    /// executable, override at `<config-dir>/stempelwerk/config.json`.
    pub fn resolve_default() -> Result<Self> {
        let defaults = Self::defaults_at(&lookup::install_dir());
        Self::resolve(defaults, &lookup::override_path())
    }

    /// Render the fully-resolved key-value set as pretty JSON.
    ///
    /// The output parses back as a valid override file reproducing the same
    /// configuration, so it can be redirected to create one.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Partial configuration as read from the local override file.
///
/// Every field is optional; only present keys shadow their defaults.
/// Unrecognised keys are rejected so a typo'd key aborts instead of being
/// silently ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverride {
    pub output_folder: Option<PathBuf>,
    pub watermark_pdf: Option<PathBuf>,
    pub tool_path: Option<PathBuf>,
    pub gui_tool_path: Option<PathBuf>,
    pub output_template: Option<String>,
    pub tool_timeout_secs: Option<u64>,
}

impl ConfigOverride {
    /// Whether the override carries no keys at all.
    pub fn is_empty(&self) -> bool {
        self.output_folder.is_none()
            && self.watermark_pdf.is_none()
            && self.tool_path.is_none()
            && self.gui_tool_path.is_none()
            && self.output_template.is_none()
            && self.tool_timeout_secs.is_none()
    }

    /// Overlay the present keys onto `defaults`.
    pub fn apply(self, defaults: StampConfig) -> StampConfig {
        StampConfig {
            output_folder: self.output_folder.unwrap_or(defaults.output_folder),
            watermark_pdf: self.watermark_pdf.unwrap_or(defaults.watermark_pdf),
            tool_path: self.tool_path.or(defaults.tool_path),
            gui_tool_path: self.gui_tool_path.or(defaults.gui_tool_path),
            output_template: self.output_template.unwrap_or(defaults.output_template),
            tool_timeout_secs: self.tool_timeout_secs.unwrap_or(defaults.tool_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> StampConfig {
        StampConfig::defaults_at(Path::new("/opt/stempelwerk"))
    }

    #[test]
    fn missing_override_yields_defaults_unmodified() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolved = StampConfig::resolve(defaults(), &dir.path().join("absent.json"))
            .expect("resolve");
        assert_eq!(resolved, defaults());
    }

    #[test]
    fn empty_override_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").expect("write");

        let resolved = StampConfig::resolve(defaults(), &path).expect("resolve");
        assert_eq!(resolved, defaults());
    }

    #[test]
    fn present_keys_shadow_defaults_key_by_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "output_folder": "/srv/stamped", "output_template": "${stem}-signed${suffix}" }"#,
        )
        .expect("write");

        let resolved = StampConfig::resolve(defaults(), &path).expect("resolve");
        assert_eq!(resolved.output_folder, PathBuf::from("/srv/stamped"));
        assert_eq!(resolved.output_template, "${stem}-signed${suffix}");
        // Keys absent from the override keep their defaults.
        assert_eq!(resolved.watermark_pdf, defaults().watermark_pdf);
        assert_eq!(resolved.tool_timeout_secs, defaults().tool_timeout_secs);
    }

    #[test]
    fn malformed_override_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ output_folder: nope").expect("write");

        let err = StampConfig::resolve(defaults(), &path).expect_err("must fail");
        assert!(matches!(err, StempelError::Config { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_key_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "output_foldr": "/srv" }"#).expect("write");

        let err = StampConfig::resolve(defaults(), &path).expect_err("must fail");
        assert!(matches!(err, StempelError::Config { .. }));
    }

    #[test]
    fn dump_round_trips_through_resolve() {
        let mut config = defaults();
        config.tool_path = Some("/usr/bin/pdftk".into());
        config.output_template = "${stem}.stamped${suffix}".into();

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, config.dump()).expect("write");

        let other_defaults = StampConfig::defaults_at(Path::new("/elsewhere"));
        let resolved = StampConfig::resolve(other_defaults, &path).expect("resolve");
        assert_eq!(resolved, config);
    }
}
