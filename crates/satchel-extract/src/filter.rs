// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cheap admission gate deciding whether a message is worth extracting from.
//!
//! Pure keyword/date-hint matching, no side effects. False negatives are
//! acceptable (they only cost a missed extraction); false positives are
//! cheap because the extractors simply return no candidates.

use regex::Regex;

/// Keywords that indicate school-related content.
const SCHOOL_KEYWORDS: &[&str] = &[
    "assignment",
    "homework",
    "hw",
    "project",
    "essay",
    "paper",
    "exam",
    "test",
    "quiz",
    "class",
    "lecture",
    "due",
    "deadline",
    "submit",
    "midterm",
    "final",
    "lab",
    "tutorial",
    "seminar",
    "workshop",
    "course",
    "subject",
    "professor",
    "prof",
    "teacher",
    "instructor",
];

/// Date-ish phrases that often indicate deadlines even without a keyword.
const DATE_HINTS: &[&str] = &[
    r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}",
    r"\d{4}-\d{1,2}-\d{1,2}",
    r"\b(?:mon|tues?|wednes|thurs?|fri|satur|sun)day\b",
    r"\btomorrow\b",
    r"\bnext\s+\w+day\b",
];

/// Keyword/heuristic gate in front of the extractors.
pub struct CandidateFilter {
    keyword_pattern: Regex,
    date_patterns: Vec<Regex>,
    min_text_len: usize,
}

impl CandidateFilter {
    /// Build a filter over the default keyword set.
    pub fn new(min_text_len: usize) -> Self {
        Self::with_keywords(SCHOOL_KEYWORDS, min_text_len)
    }

    /// Build a filter over a custom keyword set.
    pub fn with_keywords(keywords: &[&str], min_text_len: usize) -> Self {
        let pattern = format!(r"(?i)\b(?:{})\b", keywords.join("|"));
        Self {
            keyword_pattern: Regex::new(&pattern).expect("keyword pattern must compile"),
            date_patterns: DATE_HINTS
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).expect("date hint must compile"))
                .collect(),
            min_text_len,
        }
    }

    /// Whether the message should be run through extraction.
    ///
    /// Empty, whitespace-only, and too-short texts are always rejected.
    pub fn is_candidate(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.len() < self.min_text_len {
            return false;
        }

        if self.keyword_pattern.is_match(trimmed) {
            return true;
        }

        self.date_patterns.iter().any(|p| p.is_match(trimmed))
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(10)
    }
}
