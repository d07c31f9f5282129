//! Season window resolution.
//!
//! An organization defines a season as a start-month/end-month pair, which
//! may wrap across the calendar year (September-June). A team's assignment
//! carries the "season year" - the calendar year containing the season's
//! *end* month - and the resolver turns that into a concrete inclusive date
//! window used to scope analytics.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Season resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeasonError {
    /// A month bound outside 1..=12.
    #[error("month must be between 1 and 12, got {value}")]
    MonthOutOfRange { value: u32 },
}

/// A season as assigned to a team: the org definition's month bounds plus
/// the reference year of the season's end month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonAssignment {
    pub start_month: u32,
    pub end_month: u32,
    /// Calendar year containing the end of the season.
    pub season_year: i32,
}

/// A resolved, inclusive calendar-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonWindow {
    /// Resolves month bounds and a season year into a date window.
    ///
    /// A wrapping season (`start_month > end_month`) starts in the year
    /// before `season_year`. The window end is the last calendar day of the
    /// end month, computed as the day before the first of the following
    /// month so leap years need no special casing.
    pub fn resolve(
        start_month: u32,
        end_month: u32,
        season_year: i32,
    ) -> Result<Self, SeasonError> {
        for month in [start_month, end_month] {
            if !(1..=12).contains(&month) {
                return Err(SeasonError::MonthOutOfRange { value: month });
            }
        }

        let start_year = if start_month > end_month {
            season_year - 1
        } else {
            season_year
        };

        let start = NaiveDate::from_ymd_opt(start_year, start_month, 1)
            .ok_or(SeasonError::MonthOutOfRange { value: start_month })?;
        let end = last_day_of_month(season_year, end_month)
            .ok_or(SeasonError::MonthOutOfRange { value: end_month })?;

        Ok(Self { start, end })
    }

    /// Resolves the window for a team's assignment.
    pub fn for_assignment(assignment: &SeasonAssignment) -> Result<Self, SeasonError> {
        Self::resolve(
            assignment.start_month,
            assignment.end_month,
            assignment.season_year,
        )
    }

    /// Inclusive membership test on both ends.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Whether a team is in-season on `today`.
///
/// A team with no season assignment is treated as always active - the
/// legacy/unscoped fallback.
pub fn is_currently_active(
    assignment: Option<&SeasonAssignment>,
    today: NaiveDate,
) -> Result<bool, SeasonError> {
    match assignment {
        None => Ok(true),
        Some(assignment) => Ok(SeasonWindow::for_assignment(assignment)?.contains(today)),
    }
}

/// Last calendar day of (year, month): the day before the first of the next
/// month. Returns `None` only for out-of-range months.
fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn wrapping_season_starts_previous_year() {
        // September-June, season year 2026.
        let window = SeasonWindow::resolve(9, 6, 2026).unwrap();
        assert_eq!(window.start, date(2025, 9, 1));
        assert_eq!(window.end, date(2026, 6, 30));
    }

    #[test]
    fn contained_season_stays_in_one_year() {
        let window = SeasonWindow::resolve(3, 8, 2025).unwrap();
        assert_eq!(window.start, date(2025, 3, 1));
        assert_eq!(window.end, date(2025, 8, 31));
    }

    #[test]
    fn end_month_february_is_leap_aware() {
        let leap = SeasonWindow::resolve(1, 2, 2024).unwrap();
        assert_eq!(leap.end, date(2024, 2, 29));

        let common = SeasonWindow::resolve(1, 2, 2025).unwrap();
        assert_eq!(common.end, date(2025, 2, 28));
    }

    #[test]
    fn december_end_month() {
        let window = SeasonWindow::resolve(10, 12, 2025).unwrap();
        assert_eq!(window.end, date(2025, 12, 31));
    }

    #[test]
    fn single_month_season() {
        let window = SeasonWindow::resolve(7, 7, 2025).unwrap();
        assert_eq!(window.start, date(2025, 7, 1));
        assert_eq!(window.end, date(2025, 7, 31));
    }

    #[test]
    fn rejects_out_of_range_months() {
        assert!(matches!(
            SeasonWindow::resolve(0, 6, 2025),
            Err(SeasonError::MonthOutOfRange { value: 0 })
        ));
        assert!(matches!(
            SeasonWindow::resolve(3, 13, 2025),
            Err(SeasonError::MonthOutOfRange { value: 13 })
        ));
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let window = SeasonWindow::resolve(9, 6, 2026).unwrap();
        assert!(window.contains(date(2025, 9, 1)));
        assert!(window.contains(date(2026, 6, 30)));
        assert!(window.contains(date(2026, 1, 15)));
        assert!(!window.contains(date(2025, 8, 31)));
        assert!(!window.contains(date(2026, 7, 1)));
    }

    #[test]
    fn unassigned_team_is_always_active() {
        assert!(is_currently_active(None, date(2025, 7, 4)).unwrap());
    }

    #[test]
    fn assigned_team_active_only_inside_window() {
        let assignment = SeasonAssignment {
            start_month: 9,
            end_month: 6,
            season_year: 2026,
        };
        assert!(is_currently_active(Some(&assignment), date(2025, 10, 1)).unwrap());
        assert!(!is_currently_active(Some(&assignment), date(2025, 7, 15)).unwrap());
    }

    #[test]
    fn invalid_assignment_months_propagate() {
        let assignment = SeasonAssignment {
            start_month: 14,
            end_month: 6,
            season_year: 2026,
        };
        assert!(is_currently_active(Some(&assignment), date(2025, 10, 1)).is_err());
    }
}
