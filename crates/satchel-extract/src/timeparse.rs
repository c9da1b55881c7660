// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Datetime expression resolution for the pattern extractor.
//!
//! Resolves absolute dates (`12/05/2026`, `2026-03-06`), relative
//! expressions (`friday`, `next monday`, `tomorrow`, `today`), and clock
//! times (`2pm`, `11:59 PM`) against a reference instant, returning the
//! matched span so callers can strip it from titles.

use std::ops::Range;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use regex::Regex;

/// A resolved date expression.
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub date: NaiveDate,
    /// Byte range of the expression in the searched text.
    pub span: Range<usize>,
    /// Whether the expression named a calendar date rather than a
    /// relative phrase. Absolute dates carry higher extraction confidence.
    pub absolute: bool,
}

/// A resolved clock-time expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMatch {
    pub time: NaiveTime,
    pub span: Range<usize>,
}

/// Compiled datetime expression patterns.
pub struct DateTimeResolver {
    iso: Regex,
    numeric: Regex,
    weekday: Regex,
    relative_day: Regex,
    clock: Regex,
}

impl DateTimeResolver {
    pub fn new() -> Self {
        Self {
            iso: Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("iso pattern"),
            numeric: Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b")
                .expect("numeric pattern"),
            weekday: Regex::new(
                r"(?i)\b(?:(next|this)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            )
            .expect("weekday pattern"),
            relative_day: Regex::new(r"(?i)\b(today|tomorrow)\b").expect("relative pattern"),
            clock: Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)?\b|\b(\d{1,2})\s*(am|pm)\b")
                .expect("clock pattern"),
        }
    }

    /// Find the first resolvable date expression in `text`.
    ///
    /// Absolute forms are preferred over relative ones regardless of
    /// position; within a form the leftmost match wins.
    pub fn find_date(&self, text: &str, reference: DateTime<Utc>) -> Option<DateMatch> {
        if let Some(caps) = self.iso.captures(text) {
            let whole = caps.get(0).expect("group 0");
            let (y, m, d) = (
                caps[1].parse::<i32>().ok()?,
                caps[2].parse::<u32>().ok()?,
                caps[3].parse::<u32>().ok()?,
            );
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return Some(DateMatch {
                    date,
                    span: whole.range(),
                    absolute: true,
                });
            }
        }

        if let Some(caps) = self.numeric.captures(text) {
            let whole = caps.get(0).expect("group 0");
            let a = caps[1].parse::<u32>().ok()?;
            let b = caps[2].parse::<u32>().ok()?;
            let mut y = caps[3].parse::<i32>().ok()?;
            if y < 100 {
                y += 2000;
            }
            // Month-first, falling back to day-first when the month slot
            // can only be a day (e.g. 25/12/2026).
            let date = NaiveDate::from_ymd_opt(y, a, b)
                .or_else(|| NaiveDate::from_ymd_opt(y, b, a));
            if let Some(date) = date {
                return Some(DateMatch {
                    date,
                    span: whole.range(),
                    absolute: true,
                });
            }
        }

        if let Some(caps) = self.weekday.captures(text) {
            let whole = caps.get(0).expect("group 0");
            let target = parse_weekday(&caps[2]).expect("pattern only matches weekday names");
            let skip_week = caps
                .get(1)
                .is_some_and(|p| p.as_str().eq_ignore_ascii_case("next"));

            let current = reference.date_naive();
            let mut days_ahead = (i64::from(target.num_days_from_monday())
                - i64::from(current.weekday().num_days_from_monday()))
            .rem_euclid(7);
            if days_ahead == 0 {
                days_ahead = 7;
            }
            if skip_week {
                days_ahead += 7;
            }
            let date = current.checked_add_days(Days::new(days_ahead as u64))?;
            return Some(DateMatch {
                date,
                span: whole.range(),
                absolute: false,
            });
        }

        if let Some(caps) = self.relative_day.captures(text) {
            let whole = caps.get(0).expect("group 0");
            let current = reference.date_naive();
            let date = if whole.as_str().eq_ignore_ascii_case("tomorrow") {
                current.checked_add_days(Days::new(1))?
            } else {
                current
            };
            return Some(DateMatch {
                date,
                span: whole.range(),
                absolute: false,
            });
        }

        None
    }

    /// Find the first clock-time expression in `text`.
    pub fn find_time(&self, text: &str) -> Option<TimeMatch> {
        for caps in self.clock.captures_iter(text) {
            let whole = caps.get(0).expect("group 0");
            let (hour, minute, meridiem) = if let Some(h) = caps.get(1) {
                (
                    h.as_str().parse::<u32>().ok()?,
                    caps[2].parse::<u32>().ok()?,
                    caps.get(3).map(|m| m.as_str().to_ascii_lowercase()),
                )
            } else {
                (
                    caps[4].parse::<u32>().ok()?,
                    0,
                    Some(caps[5].to_ascii_lowercase()),
                )
            };

            let hour = match meridiem.as_deref() {
                Some("pm") if hour < 12 => hour + 12,
                Some("am") if hour == 12 => 0,
                Some(_) if hour > 12 => continue,
                _ => hour,
            };

            if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
                return Some(TimeMatch {
                    time,
                    span: whole.range(),
                });
            }
        }
        None
    }
}

impl Default for DateTimeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Combine a resolved date with an optional clock time into a UTC instant.
/// Dates without a time resolve to midnight.
pub fn combine(date: NaiveDate, time: Option<NaiveTime>) -> DateTime<Utc> {
    date.and_time(time.unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight")))
        .and_utc()
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
