// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fingerprinting of logical commitments.
//!
//! A fingerprint identifies a commitment by its kind, case-normalized
//! title, and anchor date truncated to the day. Two messages restating
//! the same commitment hash to the same fingerprint; the record store's
//! uniqueness constraint on it prevents double dispatch.

use sha2::{Digest, Sha256};

use satchel_core::ExtractionCandidate;

/// Case-fold and collapse whitespace so trivial rephrasings compare equal.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// SHA-256 hex fingerprint over `kind | normalized title | day`.
///
/// Candidates without any resolved date hash with a `none` day component,
/// so undated restatements of the same title still collide.
pub fn fingerprint(candidate: &ExtractionCandidate) -> String {
    let day = candidate
        .event_date()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "none".to_string());
    let payload = format!(
        "{}|{}|{}",
        candidate.kind,
        normalize_title(&candidate.title),
        day
    );
    hex::encode(Sha256::digest(payload.as_bytes()))
}
