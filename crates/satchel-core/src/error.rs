// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Satchel extraction pipeline.

use thiserror::Error;

/// The primary error type used across all Satchel crates and collaborator traits.
#[derive(Debug, Error)]
pub enum SatchelError {
    /// Configuration errors (invalid TOML, missing required fields, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed extraction output. Dropped by the caller, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transient failure from an external collaborator (LLM, calendar, tasks).
    /// Retried up to the configured maximum, then escalated.
    #[error("external service error from {collaborator}: {message}")]
    ExternalService {
        collaborator: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Call rejected without reaching the collaborator because its circuit is open.
    /// Counts as a failed attempt for retry purposes but not toward circuit statistics.
    #[error("circuit open for {collaborator}")]
    CircuitOpen { collaborator: String },

    /// Insert lost the fingerprint uniqueness race. Expected outcome under
    /// concurrent near-duplicate messages; callers treat it as already-handled.
    #[error("duplicate record for fingerprint {fingerprint}")]
    DuplicateRecord { fingerprint: String },

    /// Sender exceeded the configured admission rate. Message dropped pre-pipeline.
    #[error("rate limit exceeded for sender {sender_id}")]
    RateLimited { sender_id: String },

    /// Record store errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// External call exceeded its configured deadline. Treated like a
    /// collaborator failure for retry and circuit-breaking purposes.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SatchelError {
    /// Whether this error is eligible for retry with backoff.
    ///
    /// Transient errors are collaborator failures, timeouts, and open-circuit
    /// rejections (the latter consume an attempt without making a call).
    /// Validation and duplicate-record errors are terminal by contract.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SatchelError::ExternalService { .. }
                | SatchelError::Timeout { .. }
                | SatchelError::CircuitOpen { .. }
        )
    }
}
