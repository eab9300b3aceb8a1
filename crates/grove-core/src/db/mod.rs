//! Index storage layer
//!
//! SQLite with FTS5 mirror tables. Base tables hold the full rows; the FTS
//! mirrors hold only the searchable columns and are kept consistent by
//! triggers inside the same unit of work as every base-table mutation.

mod connection;
mod schema;
mod store;

pub use store::IndexStore;
