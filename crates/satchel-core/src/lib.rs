// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Satchel extraction pipeline.
//!
//! This crate provides the error type, domain types, and collaborator trait
//! definitions used throughout the Satchel workspace. The pipeline crates
//! depend on these seams; external services implement them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SatchelError;
pub use types::{
    DeadLetterEntry, EventKind, EventRef, ExtractionCandidate, ExtractionSource, Outcome,
    ProcessedRecord, RawMessage, TaskRef,
};

// Re-export all collaborator traits at crate root.
pub use traits::{CalendarDispatch, LlmClient, RecordStore, TaskDispatch};
