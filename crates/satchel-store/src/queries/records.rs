// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processed-record operations.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

use satchel_core::{EventKind, ProcessedRecord, SatchelError};

use crate::database::Database;
use crate::queries::{format_ts, parse_ts};

/// Insert a record unless its fingerprint already exists.
///
/// `INSERT OR IGNORE` against the fingerprint primary key makes the
/// check-and-insert a single atomic statement: under concurrent writers
/// exactly one insert reports a change.
pub async fn insert_if_absent(
    db: &Database,
    record: &ProcessedRecord,
) -> Result<bool, SatchelError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO processed_records
                 (fingerprint, message_id, kind, title, event_date,
                  created_event_ref, created_task_ref, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.fingerprint,
                    record.message_id,
                    record.kind.to_string(),
                    record.title,
                    record.event_date.map(|d| d.to_string()),
                    record.created_event_ref,
                    record.created_task_ref,
                    format_ts(record.created_at),
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether a fingerprint exists, optionally restricted to records created
/// at or after `since`.
pub async fn exists(
    db: &Database,
    fingerprint: &str,
    since: Option<DateTime<Utc>>,
) -> Result<bool, SatchelError> {
    let fingerprint = fingerprint.to_string();
    let since = since.map(format_ts);
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT 1 FROM processed_records
                 WHERE fingerprint = ?1 AND (?2 IS NULL OR created_at >= ?2)",
                params![fingerprint, since],
                |_| Ok(()),
            );
            match result {
                Ok(()) => Ok(true),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Records of the given kind anchored to the given day, newest first.
pub async fn similar_recent(
    db: &Database,
    kind: EventKind,
    day: NaiveDate,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<ProcessedRecord>, SatchelError> {
    let kind_text = kind.to_string();
    let day_text = day.to_string();
    let since = since.map(format_ts);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT fingerprint, message_id, kind, title, event_date,
                        created_event_ref, created_task_ref, created_at
                 FROM processed_records
                 WHERE kind = ?1 AND event_date = ?2
                   AND (?3 IS NULL OR created_at >= ?3)
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![kind_text, day_text, since], row_to_record)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProcessedRecord> {
    let kind_text: String = row.get(2)?;
    let event_date: Option<String> = row.get(4)?;
    let created_at: String = row.get(7)?;
    Ok(ProcessedRecord {
        fingerprint: row.get(0)?,
        message_id: row.get(1)?,
        kind: EventKind::from_str(&kind_text).unwrap_or(EventKind::Unknown),
        title: row.get(3)?,
        event_date: event_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        created_event_ref: row.get(5)?,
        created_task_ref: row.get(6)?,
        created_at: parse_ts(&created_at)?,
    })
}
