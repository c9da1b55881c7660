// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dead-letter log operations.
//!
//! Append-only from the pipeline's point of view; replay is an external
//! operational concern.

use rusqlite::params;

use satchel_core::{DeadLetterEntry, RawMessage, SatchelError};

use crate::database::Database;
use crate::queries::{format_ts, parse_ts};

/// Append a dead-letter entry.
pub async fn append(db: &Database, entry: &DeadLetterEntry) -> Result<(), SatchelError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO dead_letters
                 (message_id, chat_id, sender_id, message_text, received_at,
                  last_error, attempt_count, first_failed_at, last_failed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.message.id,
                    entry.message.chat_id,
                    entry.message.sender_id,
                    entry.message.text,
                    format_ts(entry.message.received_at),
                    entry.last_error,
                    entry.attempt_count,
                    format_ts(entry.first_failed_at),
                    format_ts(entry.last_failed_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of parked entries.
pub async fn count(db: &Database) -> Result<u64, SatchelError> {
    db.connection()
        .call(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM dead_letters", [], |row| {
                row.get(0)
            })?;
            Ok(n as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recent entries, newest first.
pub async fn recent(db: &Database, limit: u32) -> Result<Vec<DeadLetterEntry>, SatchelError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, chat_id, sender_id, message_text, received_at,
                        last_error, attempt_count, first_failed_at, last_failed_at
                 FROM dead_letters
                 ORDER BY id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let received_at: String = row.get(4)?;
                let first_failed_at: String = row.get(7)?;
                let last_failed_at: String = row.get(8)?;
                Ok(DeadLetterEntry {
                    message: RawMessage {
                        id: row.get(0)?,
                        chat_id: row.get(1)?,
                        sender_id: row.get(2)?,
                        text: row.get(3)?,
                        received_at: parse_ts(&received_at)?,
                    },
                    last_error: row.get(5)?,
                    attempt_count: row.get(6)?,
                    first_failed_at: parse_ts(&first_failed_at)?,
                    last_failed_at: parse_ts(&last_failed_at)?,
                })
            })?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn entry(message_id: &str) -> DeadLetterEntry {
        DeadLetterEntry {
            message: RawMessage {
                id: message_id.into(),
                chat_id: "chat-1".into(),
                sender_id: "sender-1".into(),
                text: "Math exam Friday 2pm".into(),
                received_at: "2026-03-04T12:00:00Z".parse().unwrap(),
            },
            last_error: "external service error from calendar: upstream 503".into(),
            attempt_count: 2,
            first_failed_at: "2026-03-04T12:00:01Z".parse().unwrap(),
            last_failed_at: "2026-03-04T12:00:03Z".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn append_and_count() {
        let (db, _dir) = setup_db().await;

        assert_eq!(count(&db).await.unwrap(), 0);
        append(&db, &entry("m1")).await.unwrap();
        append(&db, &entry("m2")).await.unwrap();
        assert_eq!(count(&db).await.unwrap(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn recent_returns_newest_first_with_round_trip() {
        let (db, _dir) = setup_db().await;

        for i in 1..=3 {
            append(&db, &entry(&format!("m{i}"))).await.unwrap();
        }

        let entries = recent(&db, 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message.id, "m3");
        assert_eq!(entries[1].message.id, "m2");
        assert_eq!(entries[0].attempt_count, 2);
        assert_eq!(
            entries[0].message.received_at,
            "2026-03-04T12:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        );

        db.close().await.unwrap();
    }
}
