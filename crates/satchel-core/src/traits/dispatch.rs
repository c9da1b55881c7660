// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar and task dispatch collaborator traits.

use async_trait::async_trait;

use crate::error::SatchelError;
use crate::types::{EventRef, ExtractionCandidate, TaskRef};

/// External calendar collaborator.
#[async_trait]
pub trait CalendarDispatch: Send + Sync {
    /// Create a calendar event for the candidate and return its reference.
    async fn create_event(
        &self,
        candidate: &ExtractionCandidate,
    ) -> Result<EventRef, SatchelError>;
}

/// External task-list collaborator.
#[async_trait]
pub trait TaskDispatch: Send + Sync {
    /// Create a task for the candidate and return its reference.
    async fn create_task(
        &self,
        candidate: &ExtractionCandidate,
    ) -> Result<TaskRef, SatchelError>;
}
