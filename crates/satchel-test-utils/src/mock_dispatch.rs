// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording mock dispatchers for the calendar and task collaborators.
//!
//! Each mock records every candidate it was asked to create and can be
//! scripted to fail a fixed number of times (or always) to exercise
//! retry, circuit-breaker, and dead-letter paths.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use satchel_core::{
    CalendarDispatch, EventRef, ExtractionCandidate, SatchelError, TaskDispatch, TaskRef,
};

/// Failure script shared by both mock dispatchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Every call succeeds.
    Never,
    /// The first `n` calls fail, the rest succeed.
    FirstN(u32),
    /// Every call fails.
    Always,
}

struct DispatchState {
    mode: FailureMode,
    calls: AtomicU32,
    created: Mutex<Vec<ExtractionCandidate>>,
}

impl DispatchState {
    fn new(mode: FailureMode) -> Self {
        Self {
            mode,
            calls: AtomicU32::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    fn attempt(
        &self,
        collaborator: &str,
        candidate: &ExtractionCandidate,
    ) -> Result<u32, SatchelError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = match self.mode {
            FailureMode::Never => false,
            FailureMode::FirstN(n) => call < n,
            FailureMode::Always => true,
        };
        if fail {
            return Err(SatchelError::ExternalService {
                collaborator: collaborator.to_string(),
                message: format!("scripted failure on call {call}"),
                source: None,
            });
        }
        self.created
            .lock()
            .expect("mock lock poisoned")
            .push(candidate.clone());
        Ok(call)
    }
}

/// Recording mock for the calendar collaborator.
pub struct MockCalendar {
    state: DispatchState,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::with_failures(FailureMode::Never)
    }

    pub fn with_failures(mode: FailureMode) -> Self {
        Self {
            state: DispatchState::new(mode),
        }
    }

    /// Candidates successfully created so far.
    pub fn created(&self) -> Vec<ExtractionCandidate> {
        self.state.created.lock().expect("mock lock poisoned").clone()
    }

    /// Total calls, failed attempts included.
    pub fn call_count(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarDispatch for MockCalendar {
    async fn create_event(
        &self,
        candidate: &ExtractionCandidate,
    ) -> Result<EventRef, SatchelError> {
        let call = self.state.attempt("calendar", candidate)?;
        Ok(EventRef(format!("evt-{call}")))
    }
}

/// Recording mock for the task collaborator.
pub struct MockTasks {
    state: DispatchState,
}

impl MockTasks {
    pub fn new() -> Self {
        Self::with_failures(FailureMode::Never)
    }

    pub fn with_failures(mode: FailureMode) -> Self {
        Self {
            state: DispatchState::new(mode),
        }
    }

    pub fn created(&self) -> Vec<ExtractionCandidate> {
        self.state.created.lock().expect("mock lock poisoned").clone()
    }

    pub fn call_count(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTasks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskDispatch for MockTasks {
    async fn create_task(
        &self,
        candidate: &ExtractionCandidate,
    ) -> Result<TaskRef, SatchelError> {
        let call = self.state.attempt("tasks", candidate)?;
        Ok(TaskRef(format!("task-{call}")))
    }
}
