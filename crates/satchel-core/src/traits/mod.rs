// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Satchel pipeline boundary.
//!
//! The core is a library-level boundary: everything outside it (record
//! store, LLM, calendar/task services) is reached through one of these
//! `#[async_trait]` seams.

pub mod dispatch;
pub mod llm;
pub mod record_store;

// Re-export all traits at the traits module level for convenience.
pub use dispatch::{CalendarDispatch, TaskDispatch};
pub use llm::LlmClient;
pub use record_store::RecordStore;
