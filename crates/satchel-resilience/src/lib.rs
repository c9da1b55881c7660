// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the Satchel pipeline: circuit breaker,
//! structured retry with backoff, and per-sender admission rate limiting.
//!
//! All state here is explicitly constructed and injected (shared via `Arc`
//! across pipeline workers), never ambient.

pub mod breaker;
pub mod rate_limit;
pub mod retry;

pub use breaker::{CircuitBreaker, CircuitState};
pub use rate_limit::RateLimiter;
pub use retry::{RetryPolicy, retry};
