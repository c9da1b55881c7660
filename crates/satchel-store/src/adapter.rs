// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RecordStore trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use satchel_core::{DeadLetterEntry, EventKind, ProcessedRecord, RecordStore, SatchelError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed record store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The fingerprint uniqueness constraint lives in the
/// schema, so `insert_if_absent` is atomic without application locking.
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    /// Open the store at the given path, creating the database and running
    /// migrations as needed.
    pub async fn open(database_path: &str) -> Result<Self, SatchelError> {
        let db = Database::open(database_path).await?;
        debug!(path = database_path, "SQLite record store initialized");
        Ok(Self { db })
    }

    /// Checkpoint and flush before shutdown.
    pub async fn close(&self) -> Result<(), SatchelError> {
        self.db.close().await
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_if_absent(&self, record: &ProcessedRecord) -> Result<bool, SatchelError> {
        queries::records::insert_if_absent(&self.db, record).await
    }

    async fn exists(
        &self,
        fingerprint: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<bool, SatchelError> {
        queries::records::exists(&self.db, fingerprint, since).await
    }

    async fn similar_recent(
        &self,
        kind: EventKind,
        day: NaiveDate,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProcessedRecord>, SatchelError> {
        queries::records::similar_recent(&self.db, kind, day, since).await
    }

    async fn append_dead_letter(&self, entry: &DeadLetterEntry) -> Result<(), SatchelError> {
        queries::dead_letter::append(&self.db, entry).await
    }

    async fn dead_letter_count(&self) -> Result<u64, SatchelError> {
        queries::dead_letter::count(&self.db).await
    }

    async fn recent_dead_letters(
        &self,
        limit: u32,
    ) -> Result<Vec<DeadLetterEntry>, SatchelError> {
        queries::dead_letter::recent(&self.db, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_core::RawMessage;
    use tempfile::tempdir;

    fn record(fingerprint: &str) -> ProcessedRecord {
        ProcessedRecord {
            fingerprint: fingerprint.into(),
            message_id: "m1".into(),
            kind: EventKind::Assignment,
            title: "math assignment".into(),
            event_date: Some(NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()),
            created_event_ref: Some("evt-1".into()),
            created_task_ref: Some("task-1".into()),
            created_at: "2026-03-04T12:00:00Z".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn full_record_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("adapter.db");
        let store = SqliteRecordStore::open(db_path.to_str().unwrap())
            .await
            .unwrap();

        assert!(store.insert_if_absent(&record("fp-1")).await.unwrap());
        assert!(!store.insert_if_absent(&record("fp-1")).await.unwrap());
        assert!(store.exists("fp-1", None).await.unwrap());

        let day = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
        let similar = store
            .similar_recent(EventKind::Assignment, day, None)
            .await
            .unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].title, "math assignment");

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn dead_letter_operations_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("dlq.db");
        let store = SqliteRecordStore::open(db_path.to_str().unwrap())
            .await
            .unwrap();

        let entry = DeadLetterEntry {
            message: RawMessage {
                id: "m1".into(),
                chat_id: "c1".into(),
                sender_id: "s1".into(),
                text: "essay due friday".into(),
                received_at: "2026-03-04T12:00:00Z".parse().unwrap(),
            },
            last_error: "operation timed out after 30s".into(),
            attempt_count: 3,
            first_failed_at: "2026-03-04T12:00:01Z".parse().unwrap(),
            last_failed_at: "2026-03-04T12:00:09Z".parse().unwrap(),
        };

        store.append_dead_letter(&entry).await.unwrap();
        assert_eq!(store.dead_letter_count().await.unwrap(), 1);

        let recent = store.recent_dead_letters(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message.text, "essay due friday");

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist.db");

        {
            let store = SqliteRecordStore::open(db_path.to_str().unwrap())
                .await
                .unwrap();
            store.insert_if_absent(&record("fp-persist")).await.unwrap();
            store.close().await.unwrap();
        }

        let store = SqliteRecordStore::open(db_path.to_str().unwrap())
            .await
            .unwrap();
        assert!(store.exists("fp-persist", None).await.unwrap());
        store.close().await.unwrap();
    }
}
