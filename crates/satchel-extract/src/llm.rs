// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based fallback extraction for text the pattern rules cannot parse.
//!
//! Calls the configured LLM collaborator through a circuit breaker and
//! validates the model's JSON output against the candidate schema.
//! Malformed output degrades to zero candidates rather than an error;
//! only transport-level failures propagate.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use satchel_core::{EventKind, ExtractionCandidate, ExtractionSource, LlmClient, SatchelError};
use satchel_resilience::CircuitBreaker;

/// Candidates below this confidence are discarded as noise.
const MIN_CONFIDENCE: f32 = 0.3;

/// Text shorter than this is never worth an LLM call.
const MIN_TEXT_LEN: usize = 10;

/// System prompt for structured extraction.
const EXTRACTION_PROMPT: &str = r#"You are an assistant that extracts school-related commitments from chat messages.

Extract every commitment present in the message. For each one output:
- "title": what the event/assignment/exam is about
- "event_type": one of "assignment", "exam", "class", "unknown"
- "date": when it occurs, ISO format (YYYY-MM-DDTHH:MM:SS) or null
- "due_date": when it is due (assignments), ISO format or null
- "location": where it occurs, or null
- "confidence": 0.0-1.0

Return ONLY a valid JSON array of such objects (no markdown, no code
blocks). If the message contains no school-related commitment, return an
empty array: []"#;

/// Raw candidate shape as produced by the model, before validation.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    title: Option<String>,
    event_type: Option<String>,
    date: Option<String>,
    due_date: Option<String>,
    location: Option<String>,
    confidence: Option<f32>,
}

/// Fallback extractor producing [`ExtractionSource::Llm`] candidates.
pub struct LlmExtractor {
    client: Arc<dyn LlmClient>,
    breaker: Arc<CircuitBreaker>,
    timeout: Duration,
}

impl LlmExtractor {
    pub fn new(client: Arc<dyn LlmClient>, breaker: Arc<CircuitBreaker>, timeout: Duration) -> Self {
        Self {
            client,
            breaker,
            timeout,
        }
    }

    /// Extract candidates from `text` via the LLM collaborator.
    ///
    /// Fails with [`SatchelError::ExternalService`] / [`SatchelError::Timeout`]
    /// when the call itself fails, and [`SatchelError::CircuitOpen`] without
    /// a network call while the breaker is open. Unusable model output is
    /// not an error: it validates down to zero candidates.
    pub async fn extract(&self, text: &str) -> Result<Vec<ExtractionCandidate>, SatchelError> {
        let trimmed = text.trim();
        if trimmed.len() < MIN_TEXT_LEN {
            return Ok(Vec::new());
        }

        let prompt = format!("{EXTRACTION_PROMPT}\n\nMessage to extract from:\n{trimmed}");
        let raw = self
            .breaker
            .call(self.timeout, self.client.complete(&prompt))
            .await?;

        Ok(parse_response(&raw))
    }
}

/// Parse and validate the model's response into candidates.
///
/// Handles markdown code fences, surrounding prose, a bare object instead
/// of an array, and malformed JSON (which yields an empty vec, logged at
/// warn level).
pub fn parse_response(response: &str) -> Vec<ExtractionCandidate> {
    let trimmed = response.trim();

    let raw: Vec<RawCandidate> = if let Some(json) = extract_delimited(trimmed, '[', ']') {
        match serde_json::from_str(json) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "failed to parse LLM extraction response");
                debug!(raw = response, "unparseable extraction response");
                return Vec::new();
            }
        }
    } else if let Some(json) = extract_delimited(trimmed, '{', '}') {
        // Some models return a single object instead of an array.
        match serde_json::from_str::<RawCandidate>(json) {
            Ok(parsed) => vec![parsed],
            Err(e) => {
                warn!(error = %e, "failed to parse LLM extraction response");
                return Vec::new();
            }
        }
    } else {
        warn!("LLM extraction response contained no JSON payload");
        return Vec::new();
    };

    raw.into_iter().filter_map(validate_candidate).collect()
}

/// Slice out the outermost delimited JSON payload, tolerating markdown
/// fences and surrounding prose.
fn extract_delimited(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start < end {
        return Some(&text[start..=end]);
    }
    None
}

fn validate_candidate(raw: RawCandidate) -> Option<ExtractionCandidate> {
    let title = raw.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        debug!("dropping extracted candidate without a title");
        return None;
    }

    let confidence = raw.confidence.unwrap_or(0.5);
    if !(0.0..=1.0).contains(&confidence) {
        debug!(confidence, "dropping candidate with out-of-range confidence");
        return None;
    }
    if confidence < MIN_CONFIDENCE {
        debug!(confidence, title, "dropping low-confidence candidate");
        return None;
    }

    let kind = raw
        .event_type
        .as_deref()
        .and_then(|s| EventKind::from_str(s.trim()).ok())
        .unwrap_or(EventKind::Unknown);

    Some(ExtractionCandidate {
        kind,
        title: title.to_string(),
        occurs_at: raw.date.as_deref().and_then(parse_datetime),
        due_at: raw.due_date.as_deref().and_then(parse_datetime),
        location: raw
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        confidence,
        source: ExtractionSource::Llm,
    })
}

/// Lenient ISO-ish datetime parsing: RFC 3339, naive datetime, bare date.
/// Naive values are taken as UTC. Unparseable strings resolve to `None`.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}
