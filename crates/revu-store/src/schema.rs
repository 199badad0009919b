use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    // Concurrent feedback writers wait on each other instead of failing
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Non-fatal: in-memory and fresh databases have nothing to checkpoint.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::info!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS review_states (
            user_id            TEXT NOT NULL,
            question_id        TEXT NOT NULL,
            content_id         TEXT NOT NULL,
            repetitions        INTEGER NOT NULL DEFAULT 0,
            ease_factor        REAL NOT NULL DEFAULT 2.5,
            interval_days      INTEGER NOT NULL DEFAULT 0,
            last_quality       INTEGER,
            last_reviewed_at   INTEGER NOT NULL,
            next_review_due_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, question_id)
        );

        CREATE TABLE IF NOT EXISTS review_log (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id               TEXT NOT NULL,
            question_id           TEXT NOT NULL,
            content_id            TEXT NOT NULL,
            quality               INTEGER NOT NULL,
            feedback              TEXT,
            response_time_seconds REAL,
            reviewed_at           INTEGER NOT NULL,
            interval_days         INTEGER NOT NULL,
            ease_factor           REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS session_stats (
            id                TEXT PRIMARY KEY,
            user_id           TEXT NOT NULL,
            strategy          TEXT NOT NULL,
            question_count    INTEGER NOT NULL,
            content_count     INTEGER NOT NULL,
            estimated_minutes REAL NOT NULL,
            created_at        INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_review_due ON review_states(user_id, next_review_due_at);
        CREATE INDEX IF NOT EXISTS idx_log_question ON review_log(user_id, question_id);
        CREATE INDEX IF NOT EXISTS idx_session_user ON session_stats(user_id);
        ",
    )?;

    if let Some(found) = stored_version(conn)?
        && found > SCHEMA_VERSION
    {
        return Err(StoreError::InvalidData(format!(
            "database schema v{found} is newer than supported v{SCHEMA_VERSION}"
        )));
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

fn stored_version(conn: &Connection) -> Result<Option<i64>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|v| {
            v.parse::<i64>()
                .map_err(|_| StoreError::InvalidData(format!("bad schema version '{v}'")))
        })
        .transpose()
}
