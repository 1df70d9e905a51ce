//! Next-due-date calculation for recurring tasks.
//!
//! A recurring task carries a compact period spec such as `"3d"`, `"2w"`, or
//! `"1m"` and optionally a set of prohibited months (1-12) in which its due
//! date must never fall. Completing the task asks this module for the next
//! occurrence's due date.
//!
//! Everything here is pure calendar arithmetic over `NaiveDate`; no I/O, no
//! clock access.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    /// The period spec did not match `<integer><d|w|m>`.
    #[error("Invalid period spec: {0:?} (expected e.g. \"5d\", \"1w\", \"2m\")")]
    InvalidPeriodSpec(String),
}

/// Unit of a recurrence period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Days,
    Weeks,
    Months,
}

/// Parsed recurrence interval, e.g. `"5d"` -> 5 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSpec {
    pub amount: u32,
    pub unit: PeriodUnit,
}

impl FromStr for PeriodSpec {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RecurrenceError::InvalidPeriodSpec(s.to_string());

        let (suffix, digits) = s.as_bytes().split_last().ok_or_else(invalid)?;
        let unit = match *suffix {
            b'd' => PeriodUnit::Days,
            b'w' => PeriodUnit::Weeks,
            b'm' => PeriodUnit::Months,
            _ => return Err(invalid()),
        };
        if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // A zero amount parses fine and acts as a no-op downstream.
        let amount = std::str::from_utf8(digits)
            .ok()
            .and_then(|d| d.parse().ok())
            .ok_or_else(invalid)?;

        Ok(Self { amount, unit })
    }
}

impl fmt::Display for PeriodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            PeriodUnit::Days => 'd',
            PeriodUnit::Weeks => 'w',
            PeriodUnit::Months => 'm',
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

/// Number of days in the given month.
fn days_in_month(year: i32, month: u32) -> u32 {
    // Day 1 of the following month, stepped back one day.
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Add whole months to a date, clamping the day to the target month's length
/// (Jan 31 + 1 month = Feb 28/29, never Mar 3).
fn add_months_clamped(base: NaiveDate, months: u32) -> NaiveDate {
    let month0 = base.month0() as i64 + months as i64;
    let year = base.year() + (month0.div_euclid(12)) as i32;
    let month = (month0.rem_euclid(12) + 1) as u32;
    let day = base.day().min(days_in_month(year, month));
    // Safe by construction: day is clamped to the month length.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(base)
}

/// Roll a date forward to the first day of the nearest non-prohibited month.
///
/// If the date's own month is allowed, this returns day 1 of that month.
/// Otherwise months are scanned forward one at a time, December wrapping to
/// January of the following year. With all twelve months prohibited the
/// original date is returned unchanged; that degenerate configuration is
/// deliberately a fallback rather than an error.
fn first_non_prohibited_month(start: NaiveDate, prohibited_months: &[u32]) -> NaiveDate {
    if prohibited_months.is_empty() {
        return start;
    }

    let mut year = start.year();
    let mut month = start.month();

    if !prohibited_months.contains(&month) {
        return start.with_day(1).unwrap_or(start);
    }

    for _ in 0..12 {
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
        if !prohibited_months.contains(&month) {
            // Day 1 always exists.
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
                return date;
            }
        }
    }

    // All months prohibited: keep the unrolled candidate.
    start
}

/// Compute the next due date for a recurring task.
///
/// `base_date` is the anchor (prior due date or completion date), `period`
/// a spec like `"5d"`, `"1w"`, `"1m"`, and `prohibited_months` the calendar
/// months (1-12) the result must avoid. Day and week periods are exact day
/// addition; month periods use calendar month arithmetic with day clamping.
/// A candidate landing in a prohibited month is rolled forward to day 1 of
/// the first allowed month.
///
/// # Errors
///
/// Returns `RecurrenceError::InvalidPeriodSpec` if `period` does not parse.
/// Callers are expected to validate period specs at the API boundary; this
/// check is a defensive backstop, not the primary validation.
pub fn compute_next_due(
    base_date: NaiveDate,
    period: &str,
    prohibited_months: &[u32],
) -> Result<NaiveDate, RecurrenceError> {
    let spec: PeriodSpec = period.parse()?;

    let mut next_due = match spec.unit {
        PeriodUnit::Days => base_date
            .checked_add_days(Days::new(spec.amount as u64))
            .unwrap_or(base_date),
        PeriodUnit::Weeks => base_date
            .checked_add_days(Days::new(spec.amount as u64 * 7))
            .unwrap_or(base_date),
        PeriodUnit::Months => add_months_clamped(base_date, spec.amount),
    };

    // Roll out of prohibited months if the candidate landed in one.
    if !prohibited_months.is_empty() && prohibited_months.contains(&next_due.month()) {
        next_due = first_non_prohibited_month(next_due, prohibited_months);
    }

    Ok(next_due)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_period_spec() {
        assert_eq!(
            "5d".parse::<PeriodSpec>().unwrap(),
            PeriodSpec {
                amount: 5,
                unit: PeriodUnit::Days
            }
        );
        assert_eq!(
            "12w".parse::<PeriodSpec>().unwrap(),
            PeriodSpec {
                amount: 12,
                unit: PeriodUnit::Weeks
            }
        );
        assert_eq!(
            "1m".parse::<PeriodSpec>().unwrap(),
            PeriodSpec {
                amount: 1,
                unit: PeriodUnit::Months
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "d", "5", "5x", "x5d", "5dd", "-1d", "1.5m", "5 d"] {
            assert!(bad.parse::<PeriodSpec>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_period_spec_display_round_trip() {
        for s in ["5d", "2w", "13m", "0d"] {
            assert_eq!(s.parse::<PeriodSpec>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_day_and_week_periods_are_exact() {
        let base = date(2024, 3, 10);
        assert_eq!(compute_next_due(base, "5d", &[]).unwrap(), date(2024, 3, 15));
        assert_eq!(compute_next_due(base, "2w", &[]).unwrap(), date(2024, 3, 24));
        assert_eq!(
            compute_next_due(date(2024, 12, 30), "3d", &[]).unwrap(),
            date(2025, 1, 2)
        );
    }

    #[test]
    fn test_zero_amount_is_a_no_op() {
        let base = date(2024, 6, 10);
        assert_eq!(compute_next_due(base, "0d", &[]).unwrap(), base);
        assert_eq!(compute_next_due(base, "0m", &[]).unwrap(), base);
    }

    #[test]
    fn test_month_addition_clamps_to_month_end() {
        // Leap year February keeps the 29th
        assert_eq!(
            compute_next_due(date(2024, 1, 31), "1m", &[]).unwrap(),
            date(2024, 2, 29)
        );
        // Non-leap year clamps to the 28th
        assert_eq!(
            compute_next_due(date(2025, 1, 31), "1m", &[]).unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            compute_next_due(date(2024, 3, 31), "1m", &[]).unwrap(),
            date(2024, 4, 30)
        );
    }

    #[test]
    fn test_month_addition_carries_into_next_year() {
        assert_eq!(
            compute_next_due(date(2024, 11, 15), "2m", &[]).unwrap(),
            date(2025, 1, 15)
        );
        // Several years at once
        assert_eq!(
            compute_next_due(date(2024, 1, 31), "13m", &[]).unwrap(),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_mid_month_day_is_preserved() {
        assert_eq!(
            compute_next_due(date(2024, 5, 12), "3m", &[]).unwrap(),
            date(2024, 8, 12)
        );
    }

    #[test]
    fn test_prohibited_month_rolls_to_first_allowed_month() {
        // Candidate lands in June; summer months are prohibited, so the due
        // date rolls to September 1st.
        assert_eq!(
            compute_next_due(date(2024, 6, 10), "0d", &[6, 7, 8]).unwrap(),
            date(2024, 9, 1)
        );
    }

    #[test]
    fn test_prohibited_month_wraps_year_boundary() {
        // November and December prohibited: a candidate in November rolls to
        // January 1st of the next year.
        assert_eq!(
            compute_next_due(date(2024, 10, 20), "1m", &[11, 12]).unwrap(),
            date(2025, 1, 1)
        );
    }

    #[test]
    fn test_allowed_month_candidate_is_untouched() {
        // Candidate month not in the prohibited set: day of month survives.
        assert_eq!(
            compute_next_due(date(2024, 3, 17), "1m", &[9, 10]).unwrap(),
            date(2024, 4, 17)
        );
    }

    #[test]
    fn test_all_months_prohibited_falls_back_to_candidate() {
        let all: Vec<u32> = (1..=12).collect();
        assert_eq!(
            compute_next_due(date(2024, 6, 10), "1m", &all).unwrap(),
            date(2024, 7, 10)
        );
    }

    #[test]
    fn test_compute_rejects_malformed_spec() {
        assert_eq!(
            compute_next_due(date(2024, 1, 1), "soon", &[]),
            Err(RecurrenceError::InvalidPeriodSpec("soon".to_string()))
        );
    }
}
