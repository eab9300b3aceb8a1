//! Repository indexing
//!
//! Pulls data from the filesystem and the `git` subprocess interface and
//! drives batch writes into the index store.

pub mod harvest;
mod indexer;
pub mod walker;

pub use indexer::{Indexer, ProgressFn, COMMIT_BATCH_SIZE, FILE_BATCH_SIZE};
