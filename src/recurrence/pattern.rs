//! # Recurrence patterns and next-occurrence math.
//!
//! [`RecurrencePattern`] parses the pattern string carried on task snapshots:
//! a fixed keyword (`daily`, `weekly`, `biweekly`, `monthly`) or an arbitrary
//! cron expression.
//!
//! ## Fixed cadence
//! [`RecurrencePattern::next_after`] advances from the occurrence's **own due
//! timestamp**, never from "now". A weekly task due Monday 09:00 that is
//! completed Thursday still recurs next Monday 09:00 — late completion (or
//! late event delivery) never shifts the cadence, which also makes the math
//! order-insensitive under redelivery.
//!
//! Monthly advances by calendar month (`chrono::Months`), clamping the day
//! when the next month is shorter (Jan 31 → Feb 28/29).

use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use cron::Schedule;

use crate::error::PatternError;

/// Parsed recurrence pattern.
#[derive(Debug, Clone)]
pub enum RecurrencePattern {
    /// Every day at the same time.
    Daily,
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
    /// Every calendar month, day-of-month clamped.
    Monthly,
    /// Arbitrary cron expression, evaluated for the next fire time strictly
    /// after the current due timestamp.
    Cron {
        /// Original expression (kept for display and equality).
        source: String,
        /// Parsed schedule.
        schedule: Box<Schedule>,
    },
}

impl RecurrencePattern {
    /// Computes the next occurrence's due timestamp, strictly after `due`.
    ///
    /// Returns `None` when the pattern yields no further fire time (possible
    /// for cron expressions with a bounded year field) or when fixed-step
    /// arithmetic overflows `chrono`'s range.
    pub fn next_after(&self, due: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            RecurrencePattern::Daily => due.checked_add_signed(Duration::days(1)),
            RecurrencePattern::Weekly => due.checked_add_signed(Duration::weeks(1)),
            RecurrencePattern::Biweekly => due.checked_add_signed(Duration::weeks(2)),
            RecurrencePattern::Monthly => due.checked_add_months(Months::new(1)),
            RecurrencePattern::Cron { schedule, .. } => schedule.after(&due).next(),
        }
    }

    /// Returns the pattern's wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Biweekly => "biweekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Cron { source, .. } => source,
        }
    }
}

impl PartialEq for RecurrencePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RecurrencePattern {}

impl std::fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrencePattern {
    type Err = PatternError;

    /// Parses a pattern string: fixed keywords are matched case-insensitively,
    /// anything else must be a valid cron expression.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "daily" => return Ok(RecurrencePattern::Daily),
            "weekly" => return Ok(RecurrencePattern::Weekly),
            "biweekly" => return Ok(RecurrencePattern::Biweekly),
            "monthly" => return Ok(RecurrencePattern::Monthly),
            _ => {}
        }

        match Schedule::from_str(trimmed) {
            Ok(schedule) => Ok(RecurrencePattern::Cron {
                source: trimmed.to_string(),
                schedule: Box::new(schedule),
            }),
            Err(e) => Err(PatternError::Unrecognized {
                pattern: trimmed.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn fixed_keywords_parse_case_insensitively() {
        assert_eq!(
            "Weekly".parse::<RecurrencePattern>().unwrap(),
            RecurrencePattern::Weekly
        );
        assert_eq!(
            " daily ".parse::<RecurrencePattern>().unwrap(),
            RecurrencePattern::Daily
        );
    }

    #[test]
    fn garbage_patterns_are_rejected() {
        let err = "every other tuesday".parse::<RecurrencePattern>();
        assert!(err.is_err());
    }

    #[test]
    fn weekly_advances_exactly_seven_days_from_due() {
        // Due Monday 09:00; completion time is irrelevant to the cadence.
        let due = ts("2026-03-02T09:00:00Z");
        let next = RecurrencePattern::Weekly.next_after(due).unwrap();
        assert_eq!(next, ts("2026-03-09T09:00:00Z"));
    }

    #[test]
    fn daily_and_biweekly_steps() {
        let due = ts("2026-03-02T09:00:00Z");
        assert_eq!(
            RecurrencePattern::Daily.next_after(due).unwrap(),
            ts("2026-03-03T09:00:00Z")
        );
        assert_eq!(
            RecurrencePattern::Biweekly.next_after(due).unwrap(),
            ts("2026-03-16T09:00:00Z")
        );
    }

    #[test]
    fn monthly_clamps_short_months() {
        let due = ts("2026-01-31T10:00:00Z");
        let next = RecurrencePattern::Monthly.next_after(due).unwrap();
        assert_eq!(next, ts("2026-02-28T10:00:00Z"));
    }

    #[test]
    fn cron_next_is_strictly_after_due() {
        // 09:00 every Monday (sec min hour dom month dow).
        let pattern: RecurrencePattern = "0 0 9 * * Mon".parse().unwrap();
        let due = ts("2026-03-02T09:00:00Z"); // a Monday at 09:00
        let next = pattern.next_after(due).unwrap();
        assert_eq!(next, ts("2026-03-09T09:00:00Z"));
    }
}
