// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-collaborator circuit breaker.
//!
//! Closed -> (consecutive failures reach threshold) -> Open -> (cool-down
//! elapses) -> HalfOpen (exactly one trial call) -> Closed on success,
//! back to Open on failure. One instance per external collaborator
//! identity; never shared across distinct services.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use satchel_core::SatchelError;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through; failures are counted.
    Closed,
    /// All calls fail fast until the cool-down elapses.
    Open,
    /// One trial call is in flight; concurrent callers are rejected as if
    /// the circuit were still open.
    HalfOpen,
}

struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding calls to one unreliable external collaborator.
///
/// State transitions happen under a single mutex, so the half-open trial
/// slot is occupied atomically: the caller that observes the cool-down
/// expiry takes the trial, everyone else keeps failing fast. Shared across
/// pipeline workers via `Arc`; state is process-lifetime and resets on
/// restart.
pub struct CircuitBreaker {
    collaborator: String,
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker for the named collaborator.
    pub fn new(collaborator: impl Into<String>, failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            collaborator: collaborator.into(),
            failure_threshold,
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// The collaborator identity this breaker guards.
    pub fn collaborator(&self) -> &str {
        &self.collaborator
    }

    /// Current state, for logging and tests.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    /// Admit or reject a call.
    ///
    /// `Ok(())` means the caller holds either a regular (closed) slot or the
    /// single half-open trial slot and MUST report the outcome via
    /// [`record_success`](Self::record_success) /
    /// [`record_failure`](Self::record_failure). Rejections fail with
    /// [`SatchelError::CircuitOpen`] without reaching the collaborator.
    pub fn try_acquire(&self) -> Result<(), SatchelError> {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => Err(SatchelError::CircuitOpen {
                collaborator: self.collaborator.clone(),
            }),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.cooldown {
                    inner.state = CircuitState::HalfOpen;
                    debug!(
                        collaborator = self.collaborator.as_str(),
                        "cool-down elapsed, permitting trial call"
                    );
                    Ok(())
                } else {
                    Err(SatchelError::CircuitOpen {
                        collaborator: self.collaborator.clone(),
                    })
                }
            }
        }
    }

    /// Report a successful call. Resets the failure counter and closes the
    /// circuit if a trial just succeeded.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        if inner.state == CircuitState::HalfOpen {
            debug!(
                collaborator = self.collaborator.as_str(),
                "trial call succeeded, closing circuit"
            );
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    /// Report a failed call. A failed trial reopens the circuit and restarts
    /// the cool-down; in the closed state the consecutive-failure counter
    /// advances and opens the circuit at the threshold.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!(
                    collaborator = self.collaborator.as_str(),
                    "trial call failed, reopening circuit"
                );
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(
                        collaborator = self.collaborator.as_str(),
                        failures = inner.consecutive_failures,
                        "failure threshold reached, opening circuit"
                    );
                }
            }
            // A failure report while already open (late completion of an
            // earlier call) keeps the circuit open; the cool-down clock is
            // not restarted.
            CircuitState::Open => {}
        }
    }

    /// Run an async operation through the breaker with a deadline.
    ///
    /// Open-circuit rejections surface as [`SatchelError::CircuitOpen`]
    /// without invoking `op` and without touching the failure statistics.
    /// A deadline overrun is reported as [`SatchelError::Timeout`] and
    /// counted as a failure. Non-transient errors (the collaborator
    /// answered, but with unusable content) count as transport successes.
    pub async fn call<T, F>(&self, deadline: Duration, op: F) -> Result<T, SatchelError>
    where
        F: Future<Output = Result<T, SatchelError>>,
    {
        self.try_acquire()?;

        let result = match tokio::time::timeout(deadline, op).await {
            Ok(inner) => inner,
            Err(_) => Err(SatchelError::Timeout { duration: deadline }),
        };

        match &result {
            Ok(_) => self.record_success(),
            Err(e) if e.is_transient() => self.record_failure(),
            Err(_) => self.record_success(),
        }
        result
    }
}
