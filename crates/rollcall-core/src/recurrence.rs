//! Recurrence rule expansion.
//!
//! Turns a recurrence template into the concrete calendar dates it covers.
//! All arithmetic happens on `chrono::NaiveDate`, a timezone-agnostic
//! calendar date, so date-only comparisons are never perturbed by anyone's
//! local-timezone rendering.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use thiserror::Error;

/// Expansion errors.
///
/// The sweep itself is total; these are validation failures raised before a
/// result is handed to persistence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// End date precedes the start date.
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    /// WEEKLY/BIWEEKLY rule with no weekdays selected.
    #[error("{frequency} rules require at least one weekday")]
    EmptyWeekdaySet { frequency: Frequency },

    /// The rule matched no dates in its range, e.g. a WEEKLY rule whose
    /// weekday set never intersects a short range.
    #[error("rule produces no occurrences in {start}..={end}")]
    NoOccurrences { start: NaiveDate, end: NaiveDate },

    /// Safety bound against runaway write amplification from a misconfigured
    /// multi-year rule.
    #[error("rule produces {count} occurrences, more than the {max} allowed")]
    TooManyOccurrences { count: usize, max: usize },
}

/// How often a template repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    /// Weekly cadence on alternating weeks, anchored to the rule's start date.
    Biweekly,
    /// Same day-of-month as the start date, skipping months that lack it.
    Monthly,
}

impl Frequency {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

/// Error type for unknown frequency strings.
#[derive(Debug, Clone, Error)]
#[error("unknown frequency: {0}")]
pub struct UnknownFrequency(String);

/// Configuration for recurrence expansion.
#[derive(Debug, Clone)]
pub struct ExpanderConfig {
    /// Upper bound on occurrences a single rule may produce. Default: 365.
    pub max_occurrences: usize,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            max_occurrences: 365,
        }
    }
}

/// A recurrence rule: the schedule half of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub start_date: NaiveDate,
    /// Inclusive end of the range.
    pub end_date: NaiveDate,
    pub frequency: Frequency,
    /// Selected weekdays; required non-empty for WEEKLY and BIWEEKLY.
    pub weekdays: Vec<Weekday>,
}

impl RecurrenceRule {
    /// Expands this rule into an ordered list of occurrence dates.
    ///
    /// Validates the rule and the size of its expansion: empty results and
    /// results beyond `config.max_occurrences` are rejected here so callers
    /// never persist a degenerate template.
    pub fn expand(&self, config: &ExpanderConfig) -> Result<Vec<NaiveDate>, RecurrenceError> {
        if self.end_date < self.start_date {
            return Err(RecurrenceError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if matches!(self.frequency, Frequency::Weekly | Frequency::Biweekly)
            && self.weekdays.is_empty()
        {
            return Err(RecurrenceError::EmptyWeekdaySet {
                frequency: self.frequency,
            });
        }

        let dates = match self.frequency {
            Frequency::Daily => self.sweep(|_| true),
            Frequency::Weekly => self.sweep(|date| self.weekdays.contains(&date.weekday())),
            Frequency::Biweekly => {
                let anchor = sunday_on_or_before(self.start_date);
                self.sweep(|date| {
                    self.weekdays.contains(&date.weekday()) && week_index(anchor, date) % 2 == 0
                })
            }
            Frequency::Monthly => self.monthly(),
        };

        if dates.is_empty() {
            return Err(RecurrenceError::NoOccurrences {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if dates.len() > config.max_occurrences {
            return Err(RecurrenceError::TooManyOccurrences {
                count: dates.len(),
                max: config.max_occurrences,
            });
        }
        tracing::debug!(
            frequency = %self.frequency,
            count = dates.len(),
            "expanded recurrence rule"
        );
        Ok(dates)
    }

    /// Day-by-day sweep over the inclusive range, keeping matching dates.
    fn sweep(&self, keep: impl Fn(NaiveDate) -> bool) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
            .filter(|date| keep(*date))
            .collect()
    }

    /// MONTHLY expansion: the start date's day-of-month in each month of the
    /// range. A month without that day contributes nothing - the candidate is
    /// never rolled into the following month.
    fn monthly(&self) -> Vec<NaiveDate> {
        let day = self.start_date.day();
        let mut year = self.start_date.year();
        let mut month = self.start_date.month();
        let mut dates = Vec::new();

        loop {
            if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
                if candidate > self.end_date {
                    break;
                }
                if candidate >= self.start_date {
                    dates.push(candidate);
                }
            } else if NaiveDate::from_ymd_opt(year, month, 1)
                .is_none_or(|first| first > self.end_date)
            {
                break;
            }

            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        dates
    }
}

/// The Sunday on or before the given date.
fn sunday_on_or_before(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Zero-based week number of `date` counted from `anchor` (a Sunday).
fn week_index(anchor: NaiveDate, date: NaiveDate) -> i64 {
    (date - anchor).num_days().div_euclid(7)
}
