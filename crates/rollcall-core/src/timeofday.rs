//! Time-of-day parsing and formatting.
//!
//! Occurrences store their start/end bounds as a wall-clock time of day,
//! separate from the calendar date. Scheduling text uses either a 12-hour
//! form (`"6:00 PM"`) or a 24-hour form (`"18:00"`).

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time-of-day parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeOfDayError {
    /// The input did not match either accepted form.
    #[error("unparseable time of day: {value}")]
    Unparseable { value: String },

    /// Hour or minute outside its valid range.
    #[error("time of day out of range: {value}")]
    OutOfRange { value: String },
}

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Creates a time of day after range validation.
    pub fn new(hour: u8, minute: u8) -> Result<Self, TimeOfDayError> {
        if hour > 23 || minute > 59 {
            return Err(TimeOfDayError::OutOfRange {
                value: format!("{hour}:{minute:02}"),
            });
        }
        Ok(Self { hour, minute })
    }

    /// The hour component (0-23).
    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    /// The minute component (0-59).
    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Pins this time of day to a calendar date, producing a UTC instant.
    ///
    /// All scheduled-start comparisons in the check-in state machine go
    /// through this single construction so date arithmetic never mixes
    /// local-time and UTC representations.
    #[must_use]
    pub fn on(self, date: NaiveDate) -> DateTime<Utc> {
        date.and_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or_else(|| {
                // Unreachable for validated fields; fall back to midnight.
                date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
            })
            .and_utc()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour12, meridiem) = match self.hour {
            0 => (12, "AM"),
            1..=11 => (self.hour, "AM"),
            12 => (12, "PM"),
            _ => (self.hour - 12, "PM"),
        };
        write!(f, "{hour12}:{:02} {meridiem}", self.minute)
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = TimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unparseable = || TimeOfDayError::Unparseable {
            value: s.to_string(),
        };

        let (clock, meridiem) = match trimmed
            .to_ascii_uppercase()
            .strip_suffix("AM")
            .map(|rest| (rest.to_string(), Some(false)))
            .or_else(|| {
                trimmed
                    .to_ascii_uppercase()
                    .strip_suffix("PM")
                    .map(|rest| (rest.to_string(), Some(true)))
            }) {
            Some((rest, m)) => (rest.trim_end().to_string(), m),
            None => (trimmed.to_string(), None),
        };

        let (hour_str, minute_str) = clock.split_once(':').ok_or_else(unparseable)?;
        let hour: u8 = hour_str.trim().parse().map_err(|_| unparseable())?;
        let minute: u8 = minute_str.trim().parse().map_err(|_| unparseable())?;

        let hour = match meridiem {
            // 12-hour clock: 12 AM is midnight, 12 PM is noon.
            Some(is_pm) => {
                if hour == 0 || hour > 12 {
                    return Err(TimeOfDayError::OutOfRange {
                        value: s.to_string(),
                    });
                }
                match (hour, is_pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, false) => h,
                    (h, true) => h + 12,
                }
            }
            None => hour,
        };

        Self::new(hour, minute).map_err(|_| TimeOfDayError::OutOfRange {
            value: s.to_string(),
        })
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeOfDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}
