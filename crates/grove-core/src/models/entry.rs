//! Persistent index row types

use serde::{Deserialize, Serialize};

/// One indexed working-tree file.
///
/// Keyed by `(repo_alias, relative_path)`; re-indexing the same path
/// replaces the whole row (last write wins), never merges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Alias of the repository this file belongs to
    pub repo_alias: String,
    /// Path relative to the repository root
    pub relative_path: String,
    /// Absolute path on disk
    pub absolute_path: String,
    /// Last modification time (Unix seconds)
    pub mod_time: i64,
    /// File size in bytes
    pub file_size: i64,
}

/// One harvested commit.
///
/// Keyed by `(repo_alias, hash)`. The harvester bounds how many commits
/// exist per repository per pass; storage itself places no limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    /// Alias of the repository this commit belongs to
    pub repo_alias: String,
    /// Full commit hash
    pub hash: String,
    /// Author name
    pub author: String,
    /// Commit subject line
    pub subject: String,
    /// Commit time (Unix seconds)
    pub commit_time: i64,
    /// Number of files changed by this commit
    pub files_changed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_entry_serializes_roundtrip() {
        let entry = FileEntry {
            repo_alias: "a".to_string(),
            relative_path: "src/main.rs".to_string(),
            absolute_path: "/work/a/src/main.rs".to_string(),
            mod_time: 1_700_000_000,
            file_size: 42,
        };

        let json = serde_json::to_string(&entry).unwrap();
        let back: FileEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
