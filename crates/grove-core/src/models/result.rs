//! Query-time result shapes
//!
//! These are constructed for the consuming picker UI and never written back
//! to storage.

use serde::{Deserialize, Serialize};

/// Whether a search result is a file or a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    File,
    Commit,
}

/// A display-ready search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// File or commit
    pub kind: ResultKind,
    /// Alias of the repository the result came from
    pub repo_alias: String,
    /// Precomputed one-line display string for the picker
    pub display: String,
    /// Repository-relative path (file results only)
    pub path: Option<String>,
    /// Full commit hash (commit results only)
    pub hash: Option<String>,
}

/// Aggregate statistics over the index store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total indexed file rows
    pub file_count: i64,
    /// Total indexed commit rows
    pub commit_count: i64,
    /// Distinct repository aliases present in the file table. A repository
    /// with commits but zero indexed files is not counted; this quirk is
    /// part of the staleness heuristic's contract.
    pub repository_count: i64,
    /// Size of the store file in bytes (page_count * page_size)
    pub store_size_bytes: i64,
}
