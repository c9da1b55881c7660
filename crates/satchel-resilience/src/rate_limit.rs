// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender admission rate limiting.
//!
//! Fixed-window counts keyed by sender id. Shared process-wide via `Arc`;
//! a rejected message is dropped before any extraction work happens.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use satchel_core::SatchelError;

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window rate limiter over sender identities.
pub struct RateLimiter {
    max_per_interval: u32,
    interval: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max_per_interval: u32, interval: Duration) -> Self {
        Self {
            max_per_interval,
            interval,
            windows: DashMap::new(),
        }
    }

    /// Admit or reject one message from the sender.
    ///
    /// Admission consumes a slot in the sender's current window. Rejection
    /// fails with [`SatchelError::RateLimited`] and consumes nothing.
    pub fn check(&self, sender_id: &str) -> Result<(), SatchelError> {
        let mut window = self
            .windows
            .entry(sender_id.to_string())
            .or_insert_with(|| Window {
                started_at: Instant::now(),
                count: 0,
            });

        if window.started_at.elapsed() >= self.interval {
            window.started_at = Instant::now();
            window.count = 0;
        }

        if window.count >= self.max_per_interval {
            debug!(sender_id, "rate limit exceeded, dropping message");
            return Err(SatchelError::RateLimited {
                sender_id: sender_id.to_string(),
            });
        }

        window.count += 1;
        Ok(())
    }

    /// Forget all windows for a sender, or all senders when `None`.
    pub fn reset(&self, sender_id: Option<&str>) {
        match sender_id {
            Some(id) => {
                self.windows.remove(id);
            }
            None => self.windows.clear(),
        }
    }
}
