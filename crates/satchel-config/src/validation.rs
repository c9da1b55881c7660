// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as thresholds staying in [0, 1] and attempt counts
//! being positive.

use thiserror::Error;

use crate::model::SatchelConfig;

/// A configuration validation error.
#[derive(Debug, Error)]
#[error("validation error: {message}")]
pub struct ConfigError {
    /// Description of the validation failure.
    pub message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SatchelConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !(0.0..=1.0).contains(&config.extraction.llm_confidence_threshold) {
        errors.push(ConfigError::new(format!(
            "extraction.llm_confidence_threshold must be in [0, 1], got {}",
            config.extraction.llm_confidence_threshold
        )));
    }

    if !(0.0..=1.0).contains(&config.dedup.similarity_threshold) {
        errors.push(ConfigError::new(format!(
            "dedup.similarity_threshold must be in [0, 1], got {}",
            config.dedup.similarity_threshold
        )));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::new("retry.max_attempts must be at least 1"));
    }

    if config.circuit.failure_threshold == 0 {
        errors.push(ConfigError::new(
            "circuit.failure_threshold must be at least 1",
        ));
    }

    if config.rate_limit.max_per_interval == 0 {
        errors.push(ConfigError::new(
            "rate_limit.max_per_interval must be at least 1",
        ));
    }

    if config.rate_limit.interval_secs == 0 {
        errors.push(ConfigError::new(
            "rate_limit.interval_secs must be at least 1",
        ));
    }

    if config.pipeline.max_in_flight == 0 {
        errors.push(ConfigError::new("pipeline.max_in_flight must be at least 1"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::new("storage.database_path must not be empty"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
