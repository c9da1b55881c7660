// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Satchel pipeline crates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An inbound chat message handed to the pipeline by a transport adapter.
///
/// Immutable; created at ingestion and discarded once the pipeline run
/// completes. Only derived facts ([`ProcessedRecord`], [`DeadLetterEntry`])
/// persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// The kind of school commitment a candidate describes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Assignment,
    Exam,
    Class,
    Unknown,
}

/// Which extractor produced a candidate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Pattern,
    Llm,
}

/// A structured extraction result prior to dedup and dispatch.
///
/// Never mutated after creation; later pipeline stages wrap it rather than
/// edit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    pub kind: EventKind,
    pub title: String,
    pub occurs_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    /// Extraction confidence in [0, 1].
    pub confidence: f32,
    pub source: ExtractionSource,
}

impl ExtractionCandidate {
    /// The date this commitment is anchored to: the due date for assignments
    /// when present, otherwise the occurrence date.
    pub fn event_datetime(&self) -> Option<DateTime<Utc>> {
        self.due_at.or(self.occurs_at)
    }

    /// The anchor date truncated to the day, as used in fingerprints and
    /// same-day duplicate queries.
    pub fn event_date(&self) -> Option<NaiveDate> {
        self.event_datetime().map(|dt| dt.date_naive())
    }
}

/// Reference to an event created in the external calendar collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef(pub String);

/// Reference to a task created in the external task collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef(pub String);

/// Durable record of a commitment the pipeline already acted on.
///
/// `fingerprint` is unique per logical commitment; the record store enforces
/// uniqueness so a fingerprint is never double-dispatched. Inserted together
/// with the dispatch it represents, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub fingerprint: String,
    pub message_id: String,
    pub kind: EventKind,
    /// Normalized title, kept so the dedup engine can score later
    /// near-duplicates against it.
    pub title: String,
    pub event_date: Option<NaiveDate>,
    pub created_event_ref: Option<String>,
    pub created_task_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A message that exhausted its retries, parked for manual inspection.
///
/// Terminal until replayed by an external operational process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub message: RawMessage,
    pub last_error: String,
    pub attempt_count: u32,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
}

/// The outcome of one message's pipeline run.
///
/// `process()` always resolves to one of these; expected failure modes never
/// escape as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Pipeline completed; zero or more candidates dispatched. Also returned
    /// for messages the filter rejected (a no-op success).
    Dispatched,
    /// Every surviving candidate was a duplicate of a prior record.
    DuplicateSkipped,
    /// At least one candidate failed terminally; a dead-letter entry was
    /// written for the message.
    DeadLettered,
}
