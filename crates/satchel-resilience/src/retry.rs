// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured retry with exponential backoff.
//!
//! A pure combinator: no ambient state, no dependence on a particular
//! concurrency primitive beyond the tokio timer. Only transient errors
//! are retried; validation failures return immediately.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use satchel_core::SatchelError;

/// Retry policy for calls to unreliable external collaborators.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Must be at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Backoff delay after the given zero-based failed attempt.
    fn backoff_for(&self, attempt: u32) -> Duration {
        // Saturate the shift so absurd attempt counts don't wrap.
        self.backoff_base * 2u32.saturating_pow(attempt.min(16))
    }
}

/// Run `op` until it succeeds, returns a terminal error, or attempts are
/// exhausted. The last error is returned on exhaustion.
///
/// An open-circuit rejection consumes an attempt (the backoff gives the
/// cool-down time to elapse) but performs no call against the collaborator.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, SatchelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SatchelError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < policy.max_attempts => {
                let delay = policy.backoff_for(attempt);
                debug!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
