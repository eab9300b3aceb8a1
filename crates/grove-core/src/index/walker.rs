//! Working-tree file walk and ignore policy

use std::path::Path;
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::models::FileEntry;

/// Files larger than this are never indexed.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Build and dependency directories that are skipped wholesale.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "out",
    "bin",
    "obj",
    "__pycache__",
    "coverage",
    "venv",
];

/// Binary, media, and archive extensions that are never indexed.
#[rustfmt::skip]
const IGNORED_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "tiff",
    // media
    "mp3", "mp4", "avi", "mov", "mkv", "wav", "flac", "ogg", "webm",
    // archives
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar",
    // binaries
    "exe", "dll", "so", "dylib", "a", "o", "class", "pyc", "wasm", "pdb",
    // data and fonts
    "pdf", "db", "sqlite", "woff", "woff2", "ttf", "eot", "otf",
];

/// Whether a directory name is excluded from the walk.
///
/// Dot-directories (`.git` included) and common build/dependency/cache
/// directories are skipped wholesale.
pub fn is_ignored_dir(name: &str) -> bool {
    if name.starts_with('.') && name != "." && name != ".." {
        return true;
    }
    IGNORED_DIRS.contains(&name)
}

/// Whether a file is excluded from indexing given its name and size.
pub fn is_ignored_file(name: &str, size: u64) -> bool {
    if name.starts_with('.') {
        return true;
    }
    if size > MAX_FILE_SIZE {
        return true;
    }
    has_ignored_extension(name)
}

fn has_ignored_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        let ext = ext.to_ascii_lowercase();
        IGNORED_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Recursively walk a repository working tree and collect index entries.
///
/// Per-entry filesystem errors are swallowed and the walk continues; the
/// affected entry is simply excluded. A missing repository root is an error,
/// so a misconfigured repository is attributable rather than silently empty.
pub fn walk_repo_files(alias: &str, root: &Path) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(Error::RepoPath(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !is_ignored_dir(&entry.file_name().to_string_lossy())
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::debug!(repo = alias, %error, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            tracing::debug!(repo = alias, path = %entry.path().display(), "skipping entry without metadata");
            continue;
        };
        if is_ignored_file(&entry.file_name().to_string_lossy(), metadata.len()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        let mod_time = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs() as i64);

        entries.push(FileEntry {
            repo_alias: alias.to_string(),
            relative_path: relative.to_string_lossy().into_owned(),
            absolute_path: entry.path().to_string_lossy().into_owned(),
            mod_time,
            file_size: metadata.len() as i64,
        });
    }

    Ok(entries)
}
