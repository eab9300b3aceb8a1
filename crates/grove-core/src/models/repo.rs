//! Configured repository model

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A configured repository: the user-assigned alias plus the working-tree
/// path it points at. Configuration loading itself lives outside this crate;
/// callers hand the resolved set to the indexer and searcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    /// Short name identifying the repository in the index and in results
    pub alias: String,
    /// Absolute path to the working tree
    pub path: PathBuf,
}

impl RepoSpec {
    /// Create a new repository spec
    pub fn new(alias: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            alias: alias.into(),
            path: path.into(),
        }
    }
}
