//! Index store operations

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for counts

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, params_from_iter, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{CommitEntry, FileEntry, IndexStats};

use super::connection;

/// Handle to the index store.
///
/// Cheap to clone; all clones share one connection. SQLite's own write
/// serialization is the only concurrency control: concurrent batch writers
/// queue up on the connection lock, but callers must not interleave a
/// clear-and-rebuild with other in-flight indexing against the same handle.
#[derive(Clone)]
pub struct IndexStore {
    conn: Arc<Mutex<Connection>>,
}

impl IndexStore {
    /// Open (creating if needed) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(connection::open(path)?))
    }

    /// Open an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn with_conn<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        f(&mut conn).map_err(Error::storage(operation))
    }

    /// Upsert a batch of file entries in one transaction.
    ///
    /// One prepared statement is reused across the whole batch; any row
    /// failure rolls back the entire batch.
    pub fn insert_files(&self, entries: &[FileEntry]) -> Result<()> {
        self.with_conn("insert_files", |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO files
                         (repo_alias, relative_path, absolute_path, mod_time, file_size)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for entry in entries {
                    stmt.execute(params![
                        entry.repo_alias,
                        entry.relative_path,
                        entry.absolute_path,
                        entry.mod_time,
                        entry.file_size,
                    ])?;
                }
            }
            tx.commit()
        })
    }

    /// Upsert a batch of commit entries in one transaction.
    pub fn insert_commits(&self, entries: &[CommitEntry]) -> Result<()> {
        self.with_conn("insert_commits", |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO commits
                         (repo_alias, hash, author, subject, commit_time, files_changed)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for entry in entries {
                    stmt.execute(params![
                        entry.repo_alias,
                        entry.hash,
                        entry.author,
                        entry.subject,
                        entry.commit_time,
                        entry.files_changed,
                    ])?;
                }
            }
            tx.commit()
        })
    }

    /// Full-text search over file paths, ordered by FTS relevance rank.
    ///
    /// `repo_filter` is an optional allow-list of aliases; empty means
    /// unfiltered.
    pub fn search_files(&self, query: &str, repo_filter: &[String]) -> Result<Vec<FileEntry>> {
        self.with_conn("search_files", |conn| {
            let mut sql = String::from(
                "SELECT f.repo_alias, f.relative_path, f.absolute_path, f.mod_time, f.file_size
                 FROM files f
                 JOIN files_fts fts ON f.rowid = fts.rowid
                 WHERE files_fts MATCH ?1",
            );
            if !repo_filter.is_empty() {
                sql.push_str(&format!(
                    " AND f.repo_alias IN ({})",
                    placeholders(2, repo_filter.len())
                ));
            }
            sql.push_str(" ORDER BY rank");

            let mut stmt = conn.prepare(&sql)?;
            let bound = std::iter::once(query).chain(repo_filter.iter().map(String::as_str));
            let rows = stmt.query_map(params_from_iter(bound), file_from_row)?;
            rows.collect()
        })
    }

    /// Full-text search over commit hash/author/subject.
    ///
    /// Ordered by commit time descending, not by relevance: commit search
    /// intentionally favors recency over match strength.
    pub fn search_commits(&self, query: &str, repo_filter: &[String]) -> Result<Vec<CommitEntry>> {
        self.with_conn("search_commits", |conn| {
            let mut sql = String::from(
                "SELECT c.repo_alias, c.hash, c.author, c.subject, c.commit_time, c.files_changed
                 FROM commits c
                 JOIN commits_fts fts ON c.rowid = fts.rowid
                 WHERE commits_fts MATCH ?1",
            );
            if !repo_filter.is_empty() {
                sql.push_str(&format!(
                    " AND c.repo_alias IN ({})",
                    placeholders(2, repo_filter.len())
                ));
            }
            sql.push_str(" ORDER BY c.commit_time DESC");

            let mut stmt = conn.prepare(&sql)?;
            let bound = std::iter::once(query).chain(repo_filter.iter().map(String::as_str));
            let rows = stmt.query_map(params_from_iter(bound), commit_from_row)?;
            rows.collect()
        })
    }

    /// All file entries, bypassing full-text matching (the "no query" case).
    pub fn all_files(&self, repo_filter: &[String]) -> Result<Vec<FileEntry>> {
        self.with_conn("all_files", |conn| {
            let mut sql = String::from(
                "SELECT repo_alias, relative_path, absolute_path, mod_time, file_size
                 FROM files",
            );
            if !repo_filter.is_empty() {
                sql.push_str(&format!(
                    " WHERE repo_alias IN ({})",
                    placeholders(1, repo_filter.len())
                ));
            }
            sql.push_str(" ORDER BY repo_alias, relative_path");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(repo_filter.iter().map(String::as_str)),
                file_from_row,
            )?;
            rows.collect()
        })
    }

    /// All commit entries, newest first.
    pub fn all_commits(&self, repo_filter: &[String]) -> Result<Vec<CommitEntry>> {
        self.with_conn("all_commits", |conn| {
            let mut sql = String::from(
                "SELECT repo_alias, hash, author, subject, commit_time, files_changed
                 FROM commits",
            );
            if !repo_filter.is_empty() {
                sql.push_str(&format!(
                    " WHERE repo_alias IN ({})",
                    placeholders(1, repo_filter.len())
                ));
            }
            sql.push_str(" ORDER BY commit_time DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(repo_filter.iter().map(String::as_str)),
                commit_from_row,
            )?;
            rows.collect()
        })
    }

    /// Delete every file and commit row for an alias.
    ///
    /// Both tables are cleared inside one transaction; the store never ends
    /// up with one table cleared and the other not.
    pub fn clear_repository(&self, alias: &str) -> Result<()> {
        self.with_conn("clear_repository", |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM files WHERE repo_alias = ?1", params![alias])?;
            tx.execute("DELETE FROM commits WHERE repo_alias = ?1", params![alias])?;
            tx.commit()
        })
    }

    /// Aggregate statistics.
    ///
    /// `repository_count` counts distinct aliases in the file table only: a
    /// repository with commits but no indexed files does not count. The
    /// staleness heuristic depends on this, so the quirk is preserved.
    pub fn stats(&self) -> Result<IndexStats> {
        self.with_conn("stats", |conn| {
            let file_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
            let commit_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM commits", [], |row| row.get(0))?;
            let repository_count: i64 = conn.query_row(
                "SELECT COUNT(DISTINCT repo_alias) FROM files",
                [],
                |row| row.get(0),
            )?;
            let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
            let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;

            Ok(IndexStats {
                file_count,
                commit_count,
                repository_count,
                store_size_bytes: page_count * page_size,
            })
        })
    }
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileEntry> {
    Ok(FileEntry {
        repo_alias: row.get(0)?,
        relative_path: row.get(1)?,
        absolute_path: row.get(2)?,
        mod_time: row.get(3)?,
        file_size: row.get(4)?,
    })
}

fn commit_from_row(row: &Row<'_>) -> rusqlite::Result<CommitEntry> {
    Ok(CommitEntry {
        repo_alias: row.get(0)?,
        hash: row.get(1)?,
        author: row.get(2)?,
        subject: row.get(3)?,
        commit_time: row.get(4)?,
        files_changed: row.get(5)?,
    })
}
