//! Index schema creation

use rusqlite::Connection;

/// Current schema version. There is no migration path: a version bump means
/// the index file is wiped and rebuilt.
pub const CURRENT_VERSION: i32 = 1;

/// Create the schema if it does not exist. Safe to invoke on every open.
pub fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS files (
            repo_alias TEXT NOT NULL,
            relative_path TEXT NOT NULL,
            absolute_path TEXT NOT NULL,
            mod_time INTEGER NOT NULL,
            file_size INTEGER NOT NULL,
            PRIMARY KEY (repo_alias, relative_path)
        );
        CREATE INDEX IF NOT EXISTS idx_files_path ON files(relative_path);

        CREATE TABLE IF NOT EXISTS commits (
            repo_alias TEXT NOT NULL,
            hash TEXT NOT NULL,
            author TEXT NOT NULL,
            subject TEXT NOT NULL,
            commit_time INTEGER NOT NULL,
            files_changed INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (repo_alias, hash)
        );
        CREATE INDEX IF NOT EXISTS idx_commits_author ON commits(author);
        CREATE INDEX IF NOT EXISTS idx_commits_subject ON commits(subject);
        CREATE INDEX IF NOT EXISTS idx_commits_time ON commits(commit_time DESC);

        CREATE VIRTUAL TABLE IF NOT EXISTS files_fts USING fts5(
            repo_alias,
            relative_path,
            content=files,
            content_rowid=rowid
        );

        CREATE VIRTUAL TABLE IF NOT EXISTS commits_fts USING fts5(
            repo_alias,
            hash,
            author,
            subject,
            content=commits,
            content_rowid=rowid
        );

        CREATE TRIGGER IF NOT EXISTS files_ai AFTER INSERT ON files BEGIN
            INSERT INTO files_fts(rowid, repo_alias, relative_path)
            VALUES (NEW.rowid, NEW.repo_alias, NEW.relative_path);
        END;
        CREATE TRIGGER IF NOT EXISTS files_ad AFTER DELETE ON files BEGIN
            INSERT INTO files_fts(files_fts, rowid, repo_alias, relative_path)
            VALUES ('delete', OLD.rowid, OLD.repo_alias, OLD.relative_path);
        END;
        CREATE TRIGGER IF NOT EXISTS files_au AFTER UPDATE ON files BEGIN
            INSERT INTO files_fts(files_fts, rowid, repo_alias, relative_path)
            VALUES ('delete', OLD.rowid, OLD.repo_alias, OLD.relative_path);
            INSERT INTO files_fts(rowid, repo_alias, relative_path)
            VALUES (NEW.rowid, NEW.repo_alias, NEW.relative_path);
        END;

        CREATE TRIGGER IF NOT EXISTS commits_ai AFTER INSERT ON commits BEGIN
            INSERT INTO commits_fts(rowid, repo_alias, hash, author, subject)
            VALUES (NEW.rowid, NEW.repo_alias, NEW.hash, NEW.author, NEW.subject);
        END;
        CREATE TRIGGER IF NOT EXISTS commits_ad AFTER DELETE ON commits BEGIN
            INSERT INTO commits_fts(commits_fts, rowid, repo_alias, hash, author, subject)
            VALUES ('delete', OLD.rowid, OLD.repo_alias, OLD.hash, OLD.author, OLD.subject);
        END;
        CREATE TRIGGER IF NOT EXISTS commits_au AFTER UPDATE ON commits BEGIN
            INSERT INTO commits_fts(commits_fts, rowid, repo_alias, hash, author, subject)
            VALUES ('delete', OLD.rowid, OLD.repo_alias, OLD.hash, OLD.author, OLD.subject);
            INSERT INTO commits_fts(rowid, repo_alias, hash, author, subject)
            VALUES (NEW.rowid, NEW.repo_alias, NEW.hash, NEW.author, NEW.subject);
        END;

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);

        COMMIT;",
    )
}

/// Read the stored schema version, or 0 when the store is brand new.
pub fn version(conn: &Connection) -> rusqlite::Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get::<_, i32>(0).map(|v| v != 0),
    )?;

    if !exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
}
