//! grove-core - Core library for Grove
//!
//! This crate contains the search-indexing engine shared by all Grove
//! interfaces (CLI, TUI picker): the SQLite-backed index store, the
//! repository indexer, and the search facade.

pub mod db;
pub mod error;
pub mod index;
pub mod models;
pub mod search;

pub use db::IndexStore;
pub use error::{Error, RepoFailure, Result, TaskKind};
pub use index::Indexer;
pub use models::{CommitEntry, FileEntry, IndexStats, RepoSpec, ResultKind, SearchResult};
pub use search::{GroupResolver, Searcher};
