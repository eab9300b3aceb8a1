//! Connection management for the index store

use std::path::Path;

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::schema;

/// Open (and if necessary create) the index store at the given path.
///
/// Parent directories are created, pragmas applied, and the schema
/// initialized. Idempotent; safe to call on every open.
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    prepare(conn)
}

/// Open an in-memory index store (useful for testing).
pub fn open_in_memory() -> Result<Connection> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection> {
    configure(&conn)?;

    let found = schema::version(&conn).map_err(Error::storage("schema_version"))?;
    if found > schema::CURRENT_VERSION {
        return Err(Error::SchemaMismatch {
            found,
            expected: schema::CURRENT_VERSION,
        });
    }

    schema::init(&conn).map_err(Error::storage("schema_init"))?;
    Ok(conn)
}

/// Configure SQLite for this workload.
fn configure(conn: &Connection) -> Result<()> {
    // WAL may be rejected on some filesystems; not fatal.
    let _ = conn.query_row("PRAGMA journal_mode = WAL", [], |row| {
        row.get::<_, String>(0)
    });
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    // REPLACE conflict resolution only fires the delete triggers that keep
    // the FTS mirrors consistent when recursive_triggers is on.
    conn.pragma_update(None, "recursive_triggers", true)?;
    conn.pragma_update(None, "cache_size", 10_000)?;
    Ok(())
}
