//! Tag-scan resolution: selecting which of today's occurrences a scan
//! applies to, and toggling its attendance record.
//!
//! The selection is pure - callers load today's occurrences (team-scoped or
//! organization-wide, ordered by start time) and the participant's existing
//! records, and this module decides what the scan means.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::checkin::{self, AttendanceRecord, CheckinError};
use crate::occurrence::Occurrence;
use crate::types::{OccurrenceId, ParticipantId, ScanAction, TagId};

/// Configuration for scan resolution.
#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// How long before the scheduled start the check-in window opens.
    /// Default: 30 minutes.
    pub early_window: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            early_window: Duration::minutes(30),
        }
    }
}

/// Scan resolution failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    /// The scan landed before any occurrence's window opened. Carries the
    /// next occurrence's title and start so callers can show a countdown
    /// instead of a bare error.
    #[error("too early: {title} starts at {starts_at}")]
    TooEarly {
        title: String,
        starts_at: DateTime<Utc>,
    },

    /// Every occurrence for today has already elapsed (or none exist).
    #[error("no events today")]
    NoEventsToday,

    /// The in-window occurrence is already fully checked out; a completed
    /// attendance cannot be re-processed via scan.
    #[error("already checked out of {title}")]
    AlreadyCompleted { title: String },

    /// The scanned tag exists but has been deactivated.
    #[error("tag {tag} is inactive")]
    InactiveTag { tag: TagId },

    /// A state-machine transition failed.
    #[error(transparent)]
    Checkin(#[from] CheckinError),
}

/// The result of a resolved scan: the record to persist and what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub occurrence_id: OccurrenceId,
    pub action: ScanAction,
    pub record: AttendanceRecord,
}

/// Resolves a scan against today's occurrences.
///
/// `occurrences` must be today's candidates in chronological start order;
/// `records` maps occurrence IDs to the participant's existing records.
///
/// Occurrences already fully checked out are skipped for selection. Among
/// the rest, the first whose window `[start - early_window, end]` contains
/// `now` is chosen - earlier-starting candidates take priority when windows
/// overlap. The scan then toggles: no record means check-in, an open record
/// means check-out.
pub fn resolve_scan(
    occurrences: &[Occurrence],
    records: &HashMap<OccurrenceId, AttendanceRecord>,
    participant: &ParticipantId,
    now: DateTime<Utc>,
    config: &ScanConfig,
) -> Result<ScanOutcome, ScanError> {
    let is_completed = |occurrence: &Occurrence| {
        records
            .get(&occurrence.id)
            .is_some_and(|r| r.checked_in_at.is_some() && r.checked_out_at.is_some())
    };
    let in_window = |occurrence: &Occurrence| {
        let opens = occurrence.scheduled_start() - config.early_window;
        opens <= now && now <= occurrence.scheduled_end()
    };

    let selected = occurrences
        .iter()
        .filter(|o| !is_completed(o))
        .find(|o| in_window(o));

    let Some(occurrence) = selected else {
        // A completed occurrence currently in-window is a conflict, not a
        // missing event: the third scan of the day must say so.
        if let Some(completed) = occurrences.iter().find(|o| is_completed(o) && in_window(o)) {
            return Err(ScanError::AlreadyCompleted {
                title: completed.title.clone(),
            });
        }
        let upcoming = occurrences
            .iter()
            .filter(|o| !is_completed(o))
            .find(|o| o.scheduled_start() > now);
        return match upcoming {
            Some(next) => Err(ScanError::TooEarly {
                title: next.title.clone(),
                starts_at: next.scheduled_start(),
            }),
            None => Err(ScanError::NoEventsToday),
        };
    };

    let outcome = match records.get(&occurrence.id) {
        None => ScanOutcome {
            occurrence_id: occurrence.id.clone(),
            action: ScanAction::CheckedIn,
            record: checkin::check_in(occurrence, participant.clone(), now),
        },
        Some(record) if record.checked_in_at.is_some() => ScanOutcome {
            occurrence_id: occurrence.id.clone(),
            action: ScanAction::CheckedOut,
            record: checkin::check_out(record.clone(), occurrence, now)?,
        },
        // A record without a check-in (e.g. a prior absent mark) scans back
        // in like a fresh one.
        Some(_) => ScanOutcome {
            occurrence_id: occurrence.id.clone(),
            action: ScanAction::CheckedIn,
            record: checkin::check_in(occurrence, participant.clone(), now),
        },
    };

    tracing::debug!(
        participant = %participant,
        occurrence = %outcome.occurrence_id,
        action = %outcome.action,
        "scan resolved"
    );
    Ok(outcome)
}
