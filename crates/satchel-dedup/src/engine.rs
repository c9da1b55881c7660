// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Duplicate-suppression engine over the record store.
//!
//! Two checks: an exact fingerprint lookup, then a title-similarity sweep
//! over same-kind, same-day records to catch near-identical rephrasings.
//! Recording delegates to the store's atomic insert-if-absent, so racing
//! workers resolve to exactly one winner.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use satchel_core::{
    EventRef, ExtractionCandidate, ProcessedRecord, RecordStore, SatchelError, TaskRef,
};

use crate::fingerprint::{fingerprint, normalize_title};
use crate::similarity::title_similarity;

/// Decides whether a candidate restates an already-recorded commitment,
/// and records the ones that don't.
pub struct DedupEngine {
    store: Arc<dyn RecordStore>,
    similarity_threshold: f64,
    lookback_days: Option<u32>,
}

impl DedupEngine {
    /// `lookback_days: None` means unbounded: records never age out of
    /// duplicate checks.
    pub fn new(
        store: Arc<dyn RecordStore>,
        similarity_threshold: f64,
        lookback_days: Option<u32>,
    ) -> Self {
        Self {
            store,
            similarity_threshold,
            lookback_days,
        }
    }

    fn lookback_cutoff(&self) -> Option<DateTime<Utc>> {
        self.lookback_days
            .map(|days| Utc::now() - Duration::days(i64::from(days)))
    }

    /// Whether the candidate is a restatement of something already recorded.
    pub async fn is_duplicate(
        &self,
        candidate: &ExtractionCandidate,
    ) -> Result<bool, SatchelError> {
        let fp = fingerprint(candidate);
        let since = self.lookback_cutoff();

        if self.store.exists(&fp, since).await? {
            debug!(fingerprint = fp.as_str(), "exact fingerprint match");
            return Ok(true);
        }

        // No exact match; sweep same-kind, same-day records for a
        // near-identical title.
        if let Some(day) = candidate.event_date() {
            let recent = self.store.similar_recent(candidate.kind, day, since).await?;
            let title = normalize_title(&candidate.title);
            for record in &recent {
                let score = title_similarity(&title, &record.title);
                if score >= self.similarity_threshold {
                    debug!(
                        title = title.as_str(),
                        existing = record.title.as_str(),
                        score,
                        "title similarity above threshold"
                    );
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Persist a record for a dispatched candidate.
    ///
    /// If another worker recorded the same fingerprint first, fails with
    /// [`SatchelError::DuplicateRecord`]; callers treat that as
    /// already-handled, not as a failure to surface.
    pub async fn record(
        &self,
        candidate: &ExtractionCandidate,
        message_id: &str,
        event_ref: Option<EventRef>,
        task_ref: Option<TaskRef>,
    ) -> Result<ProcessedRecord, SatchelError> {
        let record = ProcessedRecord {
            fingerprint: fingerprint(candidate),
            message_id: message_id.to_string(),
            kind: candidate.kind,
            title: normalize_title(&candidate.title),
            event_date: candidate.event_date(),
            created_event_ref: event_ref.map(|r| r.0),
            created_task_ref: task_ref.map(|r| r.0),
            created_at: Utc::now(),
        };

        if !self.store.insert_if_absent(&record).await? {
            return Err(SatchelError::DuplicateRecord {
                fingerprint: record.fingerprint,
            });
        }
        Ok(record)
    }
}
