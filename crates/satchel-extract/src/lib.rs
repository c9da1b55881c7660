// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction stages for the Satchel pipeline: the candidate filter, the
//! deterministic pattern extractor, and the LLM fallback extractor.

pub mod filter;
pub mod llm;
pub mod pattern;
pub mod timeparse;

pub use filter::CandidateFilter;
pub use llm::LlmExtractor;
pub use pattern::PatternExtractor;
