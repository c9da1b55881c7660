// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Satchel workspace: mock collaborators and an
//! in-memory record store with the same semantics as the SQLite one.

pub mod memory_store;
pub mod mock_dispatch;
pub mod mock_llm;

pub use memory_store::MemoryRecordStore;
pub use mock_dispatch::{FailureMode, MockCalendar, MockTasks};
pub use mock_llm::MockLlm;
