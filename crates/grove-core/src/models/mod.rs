//! Data models for the index

mod entry;
mod repo;
mod result;

pub use entry::{CommitEntry, FileEntry};
pub use repo::RepoSpec;
pub use result::{IndexStats, ResultKind, SearchResult};
