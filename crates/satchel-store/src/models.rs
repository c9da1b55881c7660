// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `satchel-core::types` for use across
//! the collaborator trait boundary. This module re-exports them for
//! convenience within the store crate.

pub use satchel_core::types::{DeadLetterEntry, ProcessedRecord, RawMessage};
