//! Persisted emotion record store.
//!
//! A single SQLite file owned by one worker thread. Every operation is sent
//! to that thread as a closure and answered over a oneshot channel, so
//! exactly one read or write executes at a time regardless of how many
//! sessions share the store.

mod migrations;

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{EmotionRecord, ToneLabel};

pub use migrations::MigrationError;

const RECORD_COLUMNS: &str =
    "id, createdAt, imagePath, imageHash, ocrText, toneScore, toneLabel, toneKeywords, modelVersion";

/// Errors surfaced by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open datastore: {0}")]
    Open(String),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("datastore error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("datastore worker is no longer running")]
    WorkerGone,
}

type StoreTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum StoreCommand {
    Execute(StoreTask),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<StoreCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            if self.sender.send(StoreCommand::Shutdown).is_err() {
                error!("store worker already gone at shutdown");
            }
            if handle.join().is_err() {
                error!("failed to join store worker thread");
            }
        }
    }
}

/// Handle to the emotion record datastore.
///
/// Cheap to clone; all clones funnel into the same worker thread.
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<StoreInner>,
    db_path: Arc<PathBuf>,
}

impl RecordStore {
    /// Open (creating if needed) the datastore at `db_path` and apply any
    /// pending schema migrations before returning.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Open(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<StoreCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), StoreError>>();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("tonemeter-store".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(StoreError::Sqlite(err)));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("failed to enable WAL mode: {err}");
                }

                let init = migrations::run_migrations(&mut conn).map_err(StoreError::from);
                let init_failed = init.is_err();
                if ready_tx.send(init).is_err() || init_failed {
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        StoreCommand::Execute(task) => task(&mut conn),
                        StoreCommand::Shutdown => break,
                    }
                }
            })
            .map_err(|e| StoreError::Open(e.to_string()))?;

        ready_rx.recv().map_err(|_| StoreError::WorkerGone)??;

        info!("record store ready at {}", db_path.display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run a task on the store worker thread and await its result.
    async fn execute<F, T>(&self, task: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = StoreCommand::Execute(Box::new(move |conn| {
            let _ = reply_tx.send(task(conn));
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|_| StoreError::WorkerGone)?;
        reply_rx.await.map_err(|_| StoreError::WorkerGone)?
    }

    /// Insert a completed analysis record.
    pub async fn insert(&self, record: EmotionRecord) -> Result<(), StoreError> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO emotion_records
                 (id, createdAt, imagePath, imageHash, ocrText, toneScore, toneLabel, toneKeywords, modelVersion)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.to_string(),
                    record.created_at.to_rfc3339(),
                    record.image_path,
                    record.image_hash,
                    record.ocr_text,
                    record.tone_score,
                    record.tone_label.as_str(),
                    record.joined_keywords(),
                    record.model_version,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Most recent record with the given image fingerprint, if any.
    pub async fn find_by_fingerprint(
        &self,
        hash: &str,
    ) -> Result<Option<EmotionRecord>, StoreError> {
        let hash = hash.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM emotion_records
                 WHERE imageHash = ?1 ORDER BY createdAt DESC LIMIT 1"
            ))?;
            let mut rows = stmt.query_map(params![hash], record_from_row)?;
            rows.next().transpose().map_err(StoreError::from)
        })
        .await
    }

    /// Fetch one record by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EmotionRecord>, StoreError> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM emotion_records WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id.to_string()], record_from_row)?;
            rows.next().transpose().map_err(StoreError::from)
        })
        .await
    }

    /// All records, newest first.
    pub async fn list_all(&self) -> Result<Vec<EmotionRecord>, StoreError> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM emotion_records ORDER BY createdAt DESC"
            ))?;
            let rows = stmt.query_map([], record_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
        .await
    }

    /// Records created within `[from, to]`, newest first.
    pub async fn filter_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<EmotionRecord>, StoreError> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM emotion_records
                 WHERE createdAt >= ?1 AND createdAt <= ?2 ORDER BY createdAt DESC"
            ))?;
            let rows = stmt.query_map(params![from.to_rfc3339(), to.to_rfc3339()], record_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
        .await
    }

    /// Delete one record. Returns whether a record was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.execute(move |conn| {
            let affected = conn.execute(
                "DELETE FROM emotion_records WHERE id = ?1",
                params![id.to_string()],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    /// Delete every record. Returns the number removed.
    pub async fn delete_all(&self) -> Result<usize, StoreError> {
        self.execute(|conn| {
            let affected = conn.execute("DELETE FROM emotion_records", [])?;
            Ok(affected)
        })
        .await
    }

    /// Average tone score of records created at or after `since`, or `None`
    /// when there are none.
    pub async fn average_score(&self, since: DateTime<Utc>) -> Result<Option<f64>, StoreError> {
        self.execute(move |conn| {
            let avg: Option<f64> = conn.query_row(
                "SELECT AVG(toneScore) FROM emotion_records WHERE createdAt >= ?1",
                params![since.to_rfc3339()],
                |row| row.get(0),
            )?;
            Ok(avg)
        })
        .await
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<EmotionRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    let created: String = row.get(1)?;
    let created_at = DateTime::parse_from_rfc3339(&created)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    let image_hash: Option<String> = row.get(3)?;

    let label: String = row.get(6)?;
    let tone_label = ToneLabel::from_str(&label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("unknown tone label {label:?}").into(),
        )
    })?;

    let keywords: String = row.get(7)?;

    Ok(EmotionRecord {
        id,
        created_at,
        image_path: row.get(2)?,
        image_hash: image_hash.unwrap_or_default(),
        ocr_text: row.get(4)?,
        tone_score: row.get(5)?,
        tone_label,
        tone_keywords: EmotionRecord::split_keywords(&keywords),
        model_version: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("tonemeter.db")).unwrap();
        (dir, store)
    }

    fn record(hash: &str, score: f64, created_at: DateTime<Utc>) -> EmotionRecord {
        EmotionRecord {
            id: Uuid::new_v4(),
            created_at,
            image_path: "/tmp/conversation.jpg".to_string(),
            image_hash: hash.to_string(),
            ocr_text: "hello\nworld".to_string(),
            tone_score: score,
            tone_label: ToneLabel::Positive,
            tone_keywords: vec!["joy".to_string(), "warmth".to_string(), "calm".to_string()],
            model_version: "gpt-4o-mini".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_fetch_by_id_round_trips_exactly() {
        let (_dir, store) = temp_store();
        let rec = record("abc123", 85.0, Utc::now());
        store.insert(rec.clone()).await.unwrap();

        let fetched = store.find_by_id(rec.id).await.unwrap().unwrap();
        assert_eq!(fetched, rec);
    }

    #[tokio::test]
    async fn test_find_by_id_missing_is_none() {
        let (_dir, store) = temp_store();
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first() {
        let (_dir, store) = temp_store();
        let base = Utc::now();
        let older = record("h1", 10.0, base - Duration::hours(2));
        let newer = record("h2", 20.0, base);
        let middle = record("h3", 15.0, base - Duration::hours(1));
        for rec in [&older, &newer, &middle] {
            store.insert(rec.clone()).await.unwrap();
        }

        let all = store.list_all().await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, middle.id, older.id]);
    }

    #[tokio::test]
    async fn test_find_by_fingerprint_returns_most_recent_match() {
        let (_dir, store) = temp_store();
        let base = Utc::now();
        let old_match = record("same", 10.0, base - Duration::days(1));
        let new_match = record("same", 90.0, base);
        let other = record("different", 50.0, base);
        for rec in [&old_match, &new_match, &other] {
            store.insert(rec.clone()).await.unwrap();
        }

        let found = store.find_by_fingerprint("same").await.unwrap().unwrap();
        assert_eq!(found.id, new_match.id);
        assert!(store.find_by_fingerprint("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filter_by_date_range() {
        let (_dir, store) = temp_store();
        let base = Utc::now();
        let inside = record("a", 50.0, base - Duration::hours(1));
        let outside = record("b", 50.0, base - Duration::days(3));
        store.insert(inside.clone()).await.unwrap();
        store.insert(outside.clone()).await.unwrap();

        let found = store
            .filter_by_date_range(base - Duration::days(1), base)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, inside.id);
    }

    #[tokio::test]
    async fn test_delete_and_delete_all() {
        let (_dir, store) = temp_store();
        let rec = record("x", 30.0, Utc::now());
        store.insert(rec.clone()).await.unwrap();

        assert!(store.delete(rec.id).await.unwrap());
        assert!(!store.delete(rec.id).await.unwrap());

        store.insert(record("y", 1.0, Utc::now())).await.unwrap();
        store.insert(record("z", 2.0, Utc::now())).await.unwrap();
        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_average_score_since_cutoff() {
        let (_dir, store) = temp_store();
        let base = Utc::now();
        store.insert(record("a", 40.0, base)).await.unwrap();
        store
            .insert(record("b", 60.0, base - Duration::hours(1)))
            .await
            .unwrap();
        store
            .insert(record("c", 100.0, base - Duration::days(10)))
            .await
            .unwrap();

        let avg = store
            .average_score(base - Duration::days(1))
            .await
            .unwrap()
            .unwrap();
        assert!((avg - 50.0).abs() < 1e-9);

        let empty = store.average_score(base + Duration::hours(1)).await.unwrap();
        assert!(empty.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_one_store() {
        let (_dir, store) = temp_store();
        let clone = store.clone();
        clone.insert(record("shared", 70.0, Utc::now())).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}
