//! Ordered, additive schema migrations for the record store.
//!
//! The schema version lives in SQLite's `user_version` pragma. Migrations
//! only ever add columns or indexes; existing data is never dropped or
//! reinterpreted.

use rusqlite::{Connection, Transaction};
use thiserror::Error;

pub(super) const CURRENT_SCHEMA_VERSION: i32 = 2;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("database schema version {found} is newer than supported version {supported}")]
    FutureSchema { found: i32, supported: i32 },

    #[error("migration to version {version} failed: {source}")]
    Step {
        version: i32,
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Bring the database up to the current schema version.
pub(super) fn run_migrations(conn: &mut Connection) -> Result<(), MigrationError> {
    let mut version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(MigrationError::FutureSchema {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        apply_migration(&tx, next).map_err(|source| MigrationError::Step {
            version: next,
            source,
        })?;
        version = next;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    tx.commit()?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> rusqlite::Result<()> {
    match version {
        // v1: base table
        1 => tx.execute_batch(
            "CREATE TABLE emotion_records (
                id TEXT PRIMARY KEY,
                createdAt TEXT NOT NULL,
                imagePath TEXT NOT NULL,
                ocrText TEXT NOT NULL,
                toneScore REAL NOT NULL,
                toneLabel TEXT NOT NULL,
                toneKeywords TEXT NOT NULL,
                modelVersion TEXT NOT NULL
            );
            CREATE INDEX idx_emotion_records_created_at ON emotion_records(createdAt);",
        ),
        // v2: image fingerprint column for duplicate detection, backfilled
        // with the empty string for pre-existing rows
        2 => tx.execute_batch(
            "ALTER TABLE emotion_records ADD COLUMN imageHash TEXT;
            UPDATE emotion_records SET imageHash = '' WHERE imageHash IS NULL;
            CREATE INDEX idx_emotion_records_image_hash ON emotion_records(imageHash);",
        ),
        _ => unreachable!("no migration registered for version {version}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_migrates_to_current() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        // All columns present, including the v2 fingerprint column.
        conn.execute(
            "INSERT INTO emotion_records
             (id, createdAt, imagePath, imageHash, ocrText, toneScore, toneLabel, toneKeywords, modelVersion)
             VALUES ('a', '2026-01-01T00:00:00+00:00', '/p', '', 't', 50.0, 'Neutral', '', 'm')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_migrations_are_idempotent_at_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
    }

    #[test]
    fn test_v2_backfills_existing_rows_with_empty_hash() {
        let mut conn = Connection::open_in_memory().unwrap();

        // Simulate a database created before the fingerprint column existed.
        {
            let tx = conn.transaction().unwrap();
            apply_migration(&tx, 1).unwrap();
            tx.execute(
                "INSERT INTO emotion_records
                 (id, createdAt, imagePath, ocrText, toneScore, toneLabel, toneKeywords, modelVersion)
                 VALUES ('old', '2025-01-01T00:00:00+00:00', '/p', 'text', 42.0, 'Negative', 'sad', 'm')",
                [],
            )
            .unwrap();
            tx.pragma_update(None, "user_version", 1).unwrap();
            tx.commit().unwrap();
        }

        run_migrations(&mut conn).unwrap();

        let hash: String = conn
            .query_row(
                "SELECT imageHash FROM emotion_records WHERE id = 'old'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hash, "");
    }

    #[test]
    fn test_future_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1)
            .unwrap();
        assert!(matches!(
            run_migrations(&mut conn).unwrap_err(),
            MigrationError::FutureSchema { .. }
        ));
    }
}
