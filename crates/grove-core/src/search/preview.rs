//! Preview generation for picker selections
//!
//! Thin glue over optional external pretty-printers with plain fallbacks.

use std::path::Path;
use std::process::Command;

use crate::error::Result;

/// Render a file preview.
///
/// Uses `bat` for syntax highlighting when it is installed; otherwise falls
/// back to the raw file contents.
pub fn file_preview(path: &Path) -> Result<String> {
    if let Ok(output) = Command::new("bat")
        .args(["--color=always", "--style=numbers", "--paging=never"])
        .arg(path)
        .output()
    {
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
    }

    Ok(std::fs::read_to_string(path)?)
}

/// Render a commit preview via `git show`.
///
/// Tries colored output first, then plain; both failing surfaces the IO
/// error from the subprocess.
pub fn commit_preview(repo_path: &Path, hash: &str) -> Result<String> {
    let colored = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(["show", "--color=always", "--stat", "--patch", hash])
        .output()?;
    if colored.status.success() {
        return Ok(String::from_utf8_lossy(&colored.stdout).into_owned());
    }

    let plain = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(["show", "--stat", "--patch", hash])
        .output()?;
    if plain.status.success() {
        Ok(String::from_utf8_lossy(&plain.stdout).into_owned())
    } else {
        Ok(String::from_utf8_lossy(&plain.stderr).into_owned())
    }
}
