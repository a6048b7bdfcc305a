// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Platform-aware path resolution: installation directory, override file
// location, and executable lookup on PATH.

use std::path::{Path, PathBuf};

/// Directory the binary is installed in. Built-in default paths (watermark
/// overlay, output folder) are resolved relative to this.
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Location of the local configuration override file.
pub fn override_path() -> PathBuf {
    config_dir().join("stempelwerk").join("config.json")
}

fn config_dir() -> PathBuf {
    // Try XDG config dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    PathBuf::from("/tmp")
}

/// Search PATH for an executable with the given name.
///
/// Returns the first matching entry, or `None` when the tool is not
/// installed anywhere on PATH.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    find_in(&path_var, name)
}

fn find_in(path_var: &std::ffi::OsStr, name: &str) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
