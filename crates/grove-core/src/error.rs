//! Error types for grove-core

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using grove-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in grove-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error, tagged with the store operation that failed
    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// SQLite error outside a named store operation
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The shared store handle was poisoned by a panicking task
    #[error("Store connection lock poisoned")]
    LockPoisoned,

    /// The on-disk schema does not match this build; the index file must be
    /// deleted and rebuilt (there is no migration path)
    #[error("Index schema version {found} does not match expected {expected}; delete the index file and rebuild")]
    SchemaMismatch { found: i32, expected: i32 },

    /// A configured repository path does not exist or is not a directory
    #[error("Repository path does not exist: {0}")]
    RepoPath(PathBuf),

    /// Rejected search term
    #[error("Invalid search term: {0}")]
    InvalidQuery(String),

    /// One or more per-repository tasks failed during a concurrent index
    /// update; every failure is listed, none are dropped
    #[error("Index update failed: {}", format_failures(.0))]
    IndexUpdate(Vec<RepoFailure>),
}

impl Error {
    /// Tag a rusqlite error with the store operation it occurred in.
    pub(crate) fn storage(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Storage { operation, source }
    }
}

/// Which half of a repository refresh a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Working-tree file walk
    Files,
    /// Commit history harvest
    Commits,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Files => write!(f, "files"),
            Self::Commits => write!(f, "commits"),
        }
    }
}

/// A single failed per-repository task inside `update_index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFailure {
    /// Alias of the repository whose task failed
    pub alias: String,
    /// Which task failed
    pub task: TaskKind,
    /// Underlying cause, already rendered
    pub message: String,
}

impl fmt::Display for RepoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.alias, self.task, self.message)
    }
}

fn format_failures(failures: &[RepoFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
