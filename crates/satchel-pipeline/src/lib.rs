// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction orchestrator for the Satchel pipeline.
//!
//! [`Pipeline::process`] runs one message through admission, filtering,
//! extraction (pattern first, LLM fallback), duplicate suppression,
//! dispatch to the external calendar/task collaborators, and, on
//! terminal failure, the dead-letter log. Expected failure modes never
//! escape as errors; every run resolves to an [`Outcome`].

pub mod runner;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use satchel_config::SatchelConfig;
use satchel_core::{
    CalendarDispatch, DeadLetterEntry, EventKind, EventRef, ExtractionCandidate, LlmClient,
    Outcome, RawMessage, RecordStore, SatchelError, TaskDispatch, TaskRef,
};
use satchel_dedup::DedupEngine;
use satchel_extract::{CandidateFilter, LlmExtractor, PatternExtractor};
use satchel_resilience::{CircuitBreaker, RateLimiter, RetryPolicy, retry};

pub use runner::PipelineRunner;

/// External collaborators the pipeline calls through narrow seams.
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    /// `None` disables LLM fallback extraction regardless of configuration.
    pub llm: Option<Arc<dyn LlmClient>>,
    pub calendar: Arc<dyn CalendarDispatch>,
    pub tasks: Arc<dyn TaskDispatch>,
}

enum CandidateOutcome {
    Dispatched,
    Duplicate,
}

/// The pipeline controller. Shared across workers via `Arc`; all mutable
/// state (circuit breakers, rate limiter windows, the record store) is
/// internally synchronized.
pub struct Pipeline {
    filter: CandidateFilter,
    pattern: PatternExtractor,
    llm: Option<LlmExtractor>,
    dedup: DedupEngine,
    store: Arc<dyn RecordStore>,
    calendar: Arc<dyn CalendarDispatch>,
    tasks: Arc<dyn TaskDispatch>,
    calendar_breaker: Arc<CircuitBreaker>,
    tasks_breaker: Arc<CircuitBreaker>,
    rate_limiter: Arc<RateLimiter>,
    retry_policy: RetryPolicy,
    llm_confidence_threshold: f32,
    dispatch_timeout: Duration,
}

impl Pipeline {
    /// Wire a pipeline from configuration and collaborators.
    ///
    /// One circuit breaker per external collaborator identity; the rate
    /// limiter and breakers live as long as the pipeline and are shared by
    /// every worker processing through it.
    pub fn new(config: &SatchelConfig, collaborators: Collaborators) -> Self {
        let retry_policy = RetryPolicy::new(
            config.retry.max_attempts,
            config.retry.backoff_base(),
        );

        let llm = if config.extraction.llm_enabled {
            collaborators.llm.map(|client| {
                let breaker = Arc::new(CircuitBreaker::new(
                    "llm",
                    config.circuit.failure_threshold,
                    config.circuit.cooldown(),
                ));
                LlmExtractor::new(client, breaker, config.extraction.llm_timeout())
            })
        } else {
            None
        };

        Self {
            filter: CandidateFilter::new(config.extraction.min_text_len),
            pattern: PatternExtractor::new(),
            llm,
            dedup: DedupEngine::new(
                collaborators.store.clone(),
                config.dedup.similarity_threshold,
                config.dedup.lookback_days,
            ),
            store: collaborators.store,
            calendar: collaborators.calendar,
            tasks: collaborators.tasks,
            calendar_breaker: Arc::new(CircuitBreaker::new(
                "calendar",
                config.circuit.failure_threshold,
                config.circuit.cooldown(),
            )),
            tasks_breaker: Arc::new(CircuitBreaker::new(
                "tasks",
                config.circuit.failure_threshold,
                config.circuit.cooldown(),
            )),
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit.max_per_interval,
                config.rate_limit.interval(),
            )),
            retry_policy,
            llm_confidence_threshold: config.extraction.llm_confidence_threshold,
            dispatch_timeout: config.pipeline.dispatch_timeout(),
        }
    }

    /// Process one message end to end.
    ///
    /// Never returns an error: admission rejections and filtered-out
    /// messages are no-op successes, duplicates are skips, and terminal
    /// failures are dead-lettered.
    pub async fn process(&self, message: &RawMessage) -> Outcome {
        if self.rate_limiter.check(&message.sender_id).is_err() {
            warn!(
                message_id = message.id.as_str(),
                sender_id = message.sender_id.as_str(),
                "sender over rate limit, dropping message"
            );
            return Outcome::Dispatched;
        }

        if !self.filter.is_candidate(&message.text) {
            debug!(
                message_id = message.id.as_str(),
                "message filtered out, nothing to extract"
            );
            return Outcome::Dispatched;
        }

        let candidates = match self.extract(message).await {
            Ok(candidates) => candidates,
            Err((error, first_failed_at)) => {
                return self.dead_letter(message, &error, first_failed_at).await;
            }
        };

        if candidates.is_empty() {
            debug!(
                message_id = message.id.as_str(),
                "no candidates extracted"
            );
            return Outcome::Dispatched;
        }

        let mut dispatched = 0usize;
        let mut duplicates = 0usize;
        let mut failure: Option<(SatchelError, DateTime<Utc>)> = None;

        for candidate in &candidates {
            match self.handle_candidate(message, candidate).await {
                Ok(CandidateOutcome::Dispatched) => dispatched += 1,
                Ok(CandidateOutcome::Duplicate) => duplicates += 1,
                Err(e) => {
                    warn!(
                        message_id = message.id.as_str(),
                        title = candidate.title.as_str(),
                        error = %e,
                        "candidate failed terminally"
                    );
                    // Keep processing the remaining candidates; the message
                    // dead-letters as a whole afterwards.
                    if failure.is_none() {
                        failure = Some((e, Utc::now()));
                    }
                }
            }
        }

        if let Some((error, first_failed_at)) = failure {
            return self.dead_letter(message, &error, first_failed_at).await;
        }

        info!(
            message_id = message.id.as_str(),
            dispatched,
            duplicates,
            "message processed"
        );

        if dispatched == 0 && duplicates > 0 {
            Outcome::DuplicateSkipped
        } else {
            Outcome::Dispatched
        }
    }

    /// Pattern extraction with conditional LLM fallback.
    ///
    /// The LLM runs only when the pattern pass produced nothing usable,
    /// with bounded retries on transient failures. Its result wins when it
    /// is more confident than the pattern's best.
    async fn extract(
        &self,
        message: &RawMessage,
    ) -> Result<Vec<ExtractionCandidate>, (SatchelError, DateTime<Utc>)> {
        let pattern_candidates = self.pattern.extract(&message.text, message.received_at);
        let pattern_best = pattern_candidates
            .iter()
            .map(|c| c.confidence)
            .fold(0.0f32, f32::max);

        let inconclusive =
            pattern_candidates.is_empty() || pattern_best < self.llm_confidence_threshold;
        let Some(llm) = (inconclusive).then_some(self.llm.as_ref()).flatten() else {
            return Ok(pattern_candidates);
        };

        debug!(
            message_id = message.id.as_str(),
            pattern_best, "pattern pass inconclusive, falling back to LLM"
        );

        let first_attempt_at = Utc::now();
        match retry(self.retry_policy, || llm.extract(&message.text)).await {
            Ok(llm_candidates) => {
                let llm_best = llm_candidates
                    .iter()
                    .map(|c| c.confidence)
                    .fold(0.0f32, f32::max);
                if !llm_candidates.is_empty() && llm_best > pattern_best {
                    debug!(message_id = message.id.as_str(), "using LLM extraction");
                    Ok(llm_candidates)
                } else {
                    Ok(pattern_candidates)
                }
            }
            Err(e) => Err((e, first_attempt_at)),
        }
    }

    /// Dedup-check, dispatch, and record one candidate.
    ///
    /// Dispatch happens before the record insert so a failed dispatch
    /// leaves nothing behind and a later retry of the message can still
    /// succeed. Losing the insert race to a concurrent worker is reported
    /// as a duplicate, not an error.
    async fn handle_candidate(
        &self,
        message: &RawMessage,
        candidate: &ExtractionCandidate,
    ) -> Result<CandidateOutcome, SatchelError> {
        if self.dedup.is_duplicate(candidate).await? {
            debug!(
                message_id = message.id.as_str(),
                title = candidate.title.as_str(),
                "duplicate candidate, skipping dispatch"
            );
            return Ok(CandidateOutcome::Duplicate);
        }

        let event_ref = if candidate.event_datetime().is_some() {
            Some(self.dispatch_event(candidate).await?)
        } else {
            None
        };

        let task_ref = if candidate.kind == EventKind::Assignment {
            Some(self.dispatch_task(candidate).await?)
        } else {
            None
        };

        match self
            .dedup
            .record(candidate, &message.id, event_ref, task_ref)
            .await
        {
            Ok(record) => {
                info!(
                    message_id = message.id.as_str(),
                    fingerprint = record.fingerprint.as_str(),
                    kind = %candidate.kind,
                    "candidate dispatched and recorded"
                );
                Ok(CandidateOutcome::Dispatched)
            }
            Err(SatchelError::DuplicateRecord { fingerprint }) => {
                debug!(
                    fingerprint = fingerprint.as_str(),
                    "lost record race to a concurrent worker, treating as handled"
                );
                Ok(CandidateOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }

    async fn dispatch_event(
        &self,
        candidate: &ExtractionCandidate,
    ) -> Result<EventRef, SatchelError> {
        retry(self.retry_policy, || {
            self.calendar_breaker
                .call(self.dispatch_timeout, self.calendar.create_event(candidate))
        })
        .await
    }

    async fn dispatch_task(
        &self,
        candidate: &ExtractionCandidate,
    ) -> Result<TaskRef, SatchelError> {
        retry(self.retry_policy, || {
            self.tasks_breaker
                .call(self.dispatch_timeout, self.tasks.create_task(candidate))
        })
        .await
    }

    /// Park the whole message in the dead-letter log.
    async fn dead_letter(
        &self,
        message: &RawMessage,
        error: &SatchelError,
        first_failed_at: DateTime<Utc>,
    ) -> Outcome {
        let entry = DeadLetterEntry {
            message: message.clone(),
            last_error: error.to_string(),
            attempt_count: self.retry_policy.max_attempts,
            first_failed_at,
            last_failed_at: Utc::now(),
        };

        if let Err(e) = self.store.append_dead_letter(&entry).await {
            // The message is lost if the store is down too; all we can do
            // is make the loss loud.
            error!(
                message_id = message.id.as_str(),
                error = %e,
                "failed to append dead-letter entry"
            );
        } else {
            warn!(
                message_id = message.id.as_str(),
                last_error = entry.last_error.as_str(),
                attempts = entry.attempt_count,
                "message dead-lettered"
            );
        }

        Outcome::DeadLettered
    }
}
