// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for the persistence backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::SatchelError;
use crate::types::{DeadLetterEntry, EventKind, ProcessedRecord};

/// Durable store of "have we already acted on this" facts.
///
/// The store is the sole cross-message synchronization point in the
/// pipeline: `insert_if_absent` must be transactional so that concurrent
/// workers racing on the same fingerprint resolve to exactly one winner.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a processed record unless its fingerprint already exists.
    ///
    /// Returns `true` if the record was inserted, `false` if the fingerprint
    /// was already present. The check-and-insert must be atomic within the
    /// store; application-level locking is not an acceptable substitute.
    async fn insert_if_absent(&self, record: &ProcessedRecord) -> Result<bool, SatchelError>;

    /// Whether a record with this fingerprint exists, optionally restricted
    /// to records created at or after `since`.
    async fn exists(
        &self,
        fingerprint: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<bool, SatchelError>;

    /// Records of the same kind anchored to the same day, for the dedup
    /// engine's title-similarity pass. `since` applies the lookback window.
    async fn similar_recent(
        &self,
        kind: EventKind,
        day: NaiveDate,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProcessedRecord>, SatchelError>;

    /// Append a message that exhausted its retries to the dead-letter log.
    async fn append_dead_letter(&self, entry: &DeadLetterEntry) -> Result<(), SatchelError>;

    /// Number of parked dead-letter entries.
    async fn dead_letter_count(&self) -> Result<u64, SatchelError>;

    /// Most recent dead-letter entries, newest first.
    async fn recent_dead_letters(&self, limit: u32) -> Result<Vec<DeadLetterEntry>, SatchelError>;
}
