// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic rule-based extraction of school commitments.
//!
//! Ordered rule groups, one per commitment kind, each pairing a keyword
//! pattern with datetime resolution. Never fails: unparseable text yields
//! an empty result and the orchestrator falls back to the LLM extractor.

use chrono::{DateTime, Utc};
use regex::Regex;

use satchel_core::{EventKind, ExtractionCandidate, ExtractionSource};

use crate::timeparse::{DateTimeResolver, combine};

/// Keywords per rule group. Order encodes specificity: assignment keywords
/// outrank exam keywords outrank class keywords when groups overlap.
const ASSIGNMENT_KEYWORDS: &[&str] = &[
    "assignment",
    "homework",
    "hw",
    "project",
    "essay",
    "paper",
    "due",
    "submit",
    "hand in",
];

const EXAM_KEYWORDS: &[&str] = &[
    "exam", "test", "quiz", "midterm", "final", "assessment", "evaluation",
];

const CLASS_KEYWORDS: &[&str] = &[
    "class", "lecture", "tutorial", "lab", "seminar", "workshop", "session",
];

/// Words that carry no meaning once the date/time spans are stripped out of
/// a title. Filtering them makes rephrasings of the same commitment
/// converge on the same normalized title.
const CONNECTIVES: &[&str] = &[
    "on", "at", "by", "in", "the", "a", "an", "is", "are", "will", "be", "this", "next", "due",
];

/// Minimum trimmed length worth extracting from.
const MIN_TEXT_LEN: usize = 10;

struct RuleGroup {
    kind: EventKind,
    keywords: Regex,
}

/// Rule-based extractor producing [`ExtractionSource::Pattern`] candidates.
pub struct PatternExtractor {
    rules: Vec<RuleGroup>,
    due_phrase: Regex,
    location: Regex,
    resolver: DateTimeResolver,
}

impl PatternExtractor {
    pub fn new() -> Self {
        let group = |kind, keywords: &[&str]| RuleGroup {
            kind,
            keywords: Regex::new(&format!(r"(?i)\b(?:{})\b", keywords.join("|")))
                .expect("keyword pattern must compile"),
        };

        Self {
            rules: vec![
                group(EventKind::Assignment, ASSIGNMENT_KEYWORDS),
                group(EventKind::Exam, EXAM_KEYWORDS),
                group(EventKind::Class, CLASS_KEYWORDS),
            ],
            due_phrase: Regex::new(r"(?i)\bdue\s*(?:on\b|by\b|:)?\s*").expect("due pattern"),
            location: Regex::new(r"(?i)\b((?:room|rm|hall|bldg|building)\s*\.?\s*[a-z0-9-]+)")
                .expect("location pattern"),
            resolver: DateTimeResolver::new(),
        }
    }

    /// Extract candidates from `text`, resolving relative dates against
    /// `reference` (the message's receive time).
    ///
    /// Returns at most one candidate: the highest-priority rule group whose
    /// keywords match and whose datetime resolves. Text without a
    /// resolvable date is left to the LLM fallback.
    pub fn extract(&self, text: &str, reference: DateTime<Utc>) -> Vec<ExtractionCandidate> {
        let text = text.trim();
        if text.len() < MIN_TEXT_LEN {
            return Vec::new();
        }

        let Some(rule) = self.rules.iter().find(|r| r.keywords.is_match(text)) else {
            return Vec::new();
        };

        let mut strip_spans: Vec<std::ops::Range<usize>> = Vec::new();

        // For assignments, a "due <date>" phrase anchors the due date;
        // otherwise any date expression in the text does.
        let date = if rule.kind == EventKind::Assignment
            && let Some(m) = self.due_phrase.find(text)
            && let Some(mut d) = self.resolver.find_date(&text[m.end()..], reference)
        {
            d.span = d.span.start + m.end()..d.span.end + m.end();
            strip_spans.push(m.range());
            Some(d)
        } else {
            self.resolver.find_date(text, reference)
        };

        let Some(date) = date else {
            return Vec::new();
        };
        strip_spans.push(date.span.clone());

        let time = self.resolver.find_time(text);
        if let Some(t) = &time {
            strip_spans.push(t.span.clone());
        }

        let location = self.location.captures(text).map(|caps| {
            let m = caps.get(1).expect("location group");
            strip_spans.push(m.range());
            m.as_str().to_string()
        });

        let when = combine(date.date, time.as_ref().map(|t| t.time));
        let (occurs_at, due_at) = match rule.kind {
            EventKind::Assignment => (None, Some(when)),
            _ => (Some(when), None),
        };

        let keyword_count = rule.keywords.find_iter(text).count();
        let mut confidence: f32 = 0.5;
        confidence += if date.absolute { 0.3 } else { 0.2 };
        if time.is_some() {
            confidence += 0.1;
        }
        if keyword_count > 1 {
            confidence += 0.1;
        }
        let confidence = confidence.min(1.0);

        let title = build_title(text, rule.kind, &strip_spans);

        vec![ExtractionCandidate {
            kind: rule.kind,
            title,
            occurs_at,
            due_at,
            location,
            confidence,
            source: ExtractionSource::Pattern,
        }]
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Title heuristic: the text minus the matched date/time/location spans,
/// minus dangling connectives, trimmed. Falls back to a generated
/// `<Kind> - <prefix>` label when nothing usable remains.
fn build_title(text: &str, kind: EventKind, strip_spans: &[std::ops::Range<usize>]) -> String {
    let mut kept = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        if strip_spans.iter().any(|s| s.contains(&idx)) {
            // Preserve token boundaries where a span was cut out.
            if !kept.ends_with(' ') {
                kept.push(' ');
            }
        } else {
            kept.push(ch);
        }
    }

    let title = kept
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|token| !token.is_empty())
        .filter(|token| !CONNECTIVES.contains(&token.to_ascii_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ");

    if (3..=100).contains(&title.len()) {
        return title;
    }

    let prefix: String = text.chars().take(50).collect();
    format!("{} - {}", capitalize(&kind.to_string()), prefix.trim())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
