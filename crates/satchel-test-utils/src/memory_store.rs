// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`RecordStore`] with the same atomic insert-if-absent
//! semantics as the SQLite implementation, for tests that don't need disk.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use satchel_core::{DeadLetterEntry, EventKind, ProcessedRecord, RecordStore, SatchelError};

#[derive(Default)]
struct Inner {
    records: HashMap<String, ProcessedRecord>,
    dead_letters: Vec<DeadLetterEntry>,
}

/// Mutex-guarded in-memory record store.
///
/// The single mutex makes the check-and-insert of `insert_if_absent`
/// atomic, mirroring the uniqueness constraint the SQLite store enforces.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored records, for assertions.
    pub async fn records(&self) -> Vec<ProcessedRecord> {
        self.inner.lock().await.records.values().cloned().collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_if_absent(&self, record: &ProcessedRecord) -> Result<bool, SatchelError> {
        let mut inner = self.inner.lock().await;
        if inner.records.contains_key(&record.fingerprint) {
            return Ok(false);
        }
        inner
            .records
            .insert(record.fingerprint.clone(), record.clone());
        Ok(true)
    }

    async fn exists(
        &self,
        fingerprint: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<bool, SatchelError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .get(fingerprint)
            .is_some_and(|r| since.is_none_or(|cutoff| r.created_at >= cutoff)))
    }

    async fn similar_recent(
        &self,
        kind: EventKind,
        day: NaiveDate,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProcessedRecord>, SatchelError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .values()
            .filter(|r| r.kind == kind && r.event_date == Some(day))
            .filter(|r| since.is_none_or(|cutoff| r.created_at >= cutoff))
            .cloned()
            .collect())
    }

    async fn append_dead_letter(&self, entry: &DeadLetterEntry) -> Result<(), SatchelError> {
        self.inner.lock().await.dead_letters.push(entry.clone());
        Ok(())
    }

    async fn dead_letter_count(&self) -> Result<u64, SatchelError> {
        Ok(self.inner.lock().await.dead_letters.len() as u64)
    }

    async fn recent_dead_letters(
        &self,
        limit: u32,
    ) -> Result<Vec<DeadLetterEntry>, SatchelError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .dead_letters
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fingerprint: &str) -> ProcessedRecord {
        ProcessedRecord {
            fingerprint: fingerprint.into(),
            message_id: "m1".into(),
            kind: EventKind::Exam,
            title: "history exam".into(),
            event_date: Some(NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()),
            created_event_ref: Some("evt-1".into()),
            created_task_ref: None,
            created_at: "2026-03-04T12:00:00Z".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_if_absent_is_first_write_wins() {
        let store = MemoryRecordStore::new();
        assert!(store.insert_if_absent(&record("fp-1")).await.unwrap());
        assert!(!store.insert_if_absent(&record("fp-1")).await.unwrap());
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn exists_honors_lookback_cutoff() {
        let store = MemoryRecordStore::new();
        store.insert_if_absent(&record("fp-1")).await.unwrap();

        assert!(store.exists("fp-1", None).await.unwrap());
        let before: DateTime<Utc> = "2026-03-01T00:00:00Z".parse().unwrap();
        assert!(store.exists("fp-1", Some(before)).await.unwrap());
        let after: DateTime<Utc> = "2026-03-05T00:00:00Z".parse().unwrap();
        assert!(!store.exists("fp-1", Some(after)).await.unwrap());
    }

    #[tokio::test]
    async fn similar_recent_filters_kind_and_day() {
        let store = MemoryRecordStore::new();
        store.insert_if_absent(&record("fp-1")).await.unwrap();

        let same_day = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
        let other_day = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();

        assert_eq!(
            store
                .similar_recent(EventKind::Exam, same_day, None)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(
            store
                .similar_recent(EventKind::Exam, other_day, None)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .similar_recent(EventKind::Class, same_day, None)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn dead_letters_accumulate_newest_first() {
        let store = MemoryRecordStore::new();
        for i in 0..3 {
            let entry = DeadLetterEntry {
                message: satchel_core::RawMessage {
                    id: format!("m{i}"),
                    chat_id: "c1".into(),
                    sender_id: "s1".into(),
                    text: "text".into(),
                    received_at: "2026-03-04T12:00:00Z".parse().unwrap(),
                },
                last_error: "boom".into(),
                attempt_count: 2,
                first_failed_at: "2026-03-04T12:00:00Z".parse().unwrap(),
                last_failed_at: "2026-03-04T12:01:00Z".parse().unwrap(),
            };
            store.append_dead_letter(&entry).await.unwrap();
        }

        assert_eq!(store.dead_letter_count().await.unwrap(), 3);
        let recent = store.recent_dead_letters(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message.id, "m2");
    }
}
