// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Satchel pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Durations are expressed as integer seconds or
//! milliseconds fields and exposed as [`std::time::Duration`] via accessors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Satchel configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SatchelConfig {
    /// Candidate filter and extractor settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Retry/backoff settings for external calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Circuit breaker settings, shared by all per-collaborator breakers.
    #[serde(default)]
    pub circuit: CircuitConfig,

    /// Duplicate-suppression settings.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Per-sender admission rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Record store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Orchestrator concurrency and dispatch settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Candidate filter and extractor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Whether the LLM fallback extractor is enabled at all.
    #[serde(default = "default_llm_enabled")]
    pub llm_enabled: bool,

    /// Pattern-extraction confidence below which the LLM fallback runs.
    #[serde(default = "default_llm_confidence_threshold")]
    pub llm_confidence_threshold: f32,

    /// Deadline for a single LLM call, in seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Messages shorter than this (after trimming) are never candidates.
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            llm_enabled: default_llm_enabled(),
            llm_confidence_threshold: default_llm_confidence_threshold(),
            llm_timeout_secs: default_llm_timeout_secs(),
            min_text_len: default_min_text_len(),
        }
    }
}

impl ExtractionConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn default_llm_enabled() -> bool {
    true
}

fn default_llm_confidence_threshold() -> f32 {
    0.6
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_min_text_len() -> usize {
    10
}

/// Retry/backoff configuration for transient external failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum attempts per external call (first try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds; doubles per attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    500
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitConfig {
    /// Consecutive failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Cool-down before a half-open trial call is permitted, in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl CircuitConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_cooldown_secs() -> u64 {
    30
}

/// Duplicate-suppression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Title similarity at or above which a same-kind, same-day candidate is
    /// treated as a duplicate even without an exact fingerprint match.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Lookback window in days for duplicate checks. `None` means unbounded:
    /// a commitment recorded at any time suppresses re-dispatch.
    #[serde(default)]
    pub lookback_days: Option<u32>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            lookback_days: None,
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.8
}

/// Per-sender admission rate limiting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Messages admitted per sender per interval.
    #[serde(default = "default_max_per_interval")]
    pub max_per_interval: u32,

    /// Window length in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_interval: default_max_per_interval(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_max_per_interval() -> u32 {
    10
}

fn default_interval_secs() -> u64 {
    60
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("satchel").join("satchel.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("satchel.db"))
        .to_string_lossy()
        .into_owned()
}

/// Orchestrator concurrency and dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum concurrently processed messages in the intake loop.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Deadline for a single calendar/task dispatch call, in seconds.
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
        }
    }
}

impl PipelineConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}

fn default_max_in_flight() -> usize {
    8
}

fn default_dispatch_timeout_secs() -> u64 {
    30
}
