//! The check-in state machine.
//!
//! One attendance record exists per (participant, occurrence) pair. States
//! and transitions:
//!
//! ```text
//! UNRECORDED --check-in--> ON_TIME | LATE
//! ON_TIME/LATE --check-out--> ON_TIME/LATE (terminal, hours populated)
//! UNRECORDED --administrative mark--> ABSENT | EXCUSED (terminal)
//! recorded --administrative correction--> any status (re-entrant)
//! ```
//!
//! Persistence of the resulting record is an upsert keyed by the pair, so
//! concurrent duplicate check-ins converge to one record. These functions
//! are pure: they take the current record (if any) and return the next one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::occurrence::Occurrence;
use crate::types::{AttendanceStatus, OccurrenceId, ParticipantId};

/// Check-in/check-out transition errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckinError {
    /// Check-out requires a prior check-in.
    #[error("no check-in recorded for participant {participant}")]
    NotCheckedIn { participant: ParticipantId },

    /// The record already carries both timestamps.
    #[error("participant {participant} already checked out")]
    AlreadyCheckedOut { participant: ParticipantId },
}

/// The per-participant-per-occurrence ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub participant_id: ParticipantId,
    pub occurrence_id: OccurrenceId,
    pub status: AttendanceStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    /// Credited hours, non-negative, two-decimal precision.
    pub hours: f64,
    pub note: Option<String>,
    /// Set for impromptu attendance pending coach approval.
    pub ad_hoc: bool,
    /// Cleared for ad-hoc records until a coach approves them.
    pub approved: bool,
}

/// Three-way timestamp input for administrative corrections.
///
/// Distinguishes "use the default" from "explicitly clear" - a single
/// nullable field cannot express both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPatch {
    /// Use the default (the current instant).
    #[default]
    Default,
    /// Use the supplied instant.
    Set(DateTime<Utc>),
    /// Explicitly clear the timestamp.
    Clear,
}

impl TimestampPatch {
    const fn resolve(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Default => Some(now),
            Self::Set(t) => Some(t),
            Self::Clear => None,
        }
    }
}

/// Records a check-in for a participant at an occurrence.
///
/// An instant at or before the scheduled start is `OnTime`; anything after
/// is `Late`. The record starts with no check-out and zero hours.
#[must_use]
pub fn check_in(
    occurrence: &Occurrence,
    participant: ParticipantId,
    now: DateTime<Utc>,
) -> AttendanceRecord {
    let status = if now <= occurrence.scheduled_start() {
        AttendanceStatus::OnTime
    } else {
        AttendanceStatus::Late
    };
    tracing::debug!(
        participant = %participant,
        occurrence = %occurrence.id,
        %status,
        "check-in"
    );
    AttendanceRecord {
        participant_id: participant,
        occurrence_id: occurrence.id.clone(),
        status,
        checked_in_at: Some(now),
        checked_out_at: None,
        hours: 0.0,
        note: None,
        ad_hoc: occurrence.ad_hoc,
        approved: !occurrence.ad_hoc,
    }
}

/// Records a check-out, computing credited hours.
///
/// The effective start clamps an early check-in forward to the scheduled
/// start: arriving early accrues no credit before the activity begins.
/// Status is left as it was at check-in.
pub fn check_out(
    record: AttendanceRecord,
    occurrence: &Occurrence,
    now: DateTime<Utc>,
) -> Result<AttendanceRecord, CheckinError> {
    let Some(checked_in_at) = record.checked_in_at else {
        return Err(CheckinError::NotCheckedIn {
            participant: record.participant_id,
        });
    };
    if record.checked_out_at.is_some() {
        return Err(CheckinError::AlreadyCheckedOut {
            participant: record.participant_id,
        });
    }

    let hours = credited_hours(checked_in_at, now, occurrence.scheduled_start());
    tracing::debug!(
        participant = %record.participant_id,
        occurrence = %occurrence.id,
        hours,
        "check-out"
    );
    Ok(AttendanceRecord {
        checked_out_at: Some(now),
        hours,
        ..record
    })
}

/// Applies an administrative mark or correction.
///
/// `Absent` and `Excused` always null both timestamps and zero the hours,
/// regardless of the supplied patches. For attending statuses each timestamp
/// patch resolves independently (default = `now`); when both timestamps end
/// up present, hours are recomputed with the same effective-start clamp as
/// check-out. Re-issuing the same mark is idempotent.
#[must_use]
pub fn apply_mark(
    existing: Option<AttendanceRecord>,
    occurrence: &Occurrence,
    participant: ParticipantId,
    status: AttendanceStatus,
    check_in: TimestampPatch,
    check_out: TimestampPatch,
    now: DateTime<Utc>,
) -> AttendanceRecord {
    let base = existing.unwrap_or(AttendanceRecord {
        participant_id: participant,
        occurrence_id: occurrence.id.clone(),
        status,
        checked_in_at: None,
        checked_out_at: None,
        hours: 0.0,
        note: None,
        ad_hoc: occurrence.ad_hoc,
        approved: !occurrence.ad_hoc,
    });

    if status.is_non_attending() {
        return AttendanceRecord {
            status,
            checked_in_at: None,
            checked_out_at: None,
            hours: 0.0,
            ..base
        };
    }

    let checked_in_at = check_in.resolve(now);
    let checked_out_at = check_out.resolve(now);
    let hours = match (checked_in_at, checked_out_at) {
        (Some(started), Some(ended)) => {
            credited_hours(started, ended, occurrence.scheduled_start())
        }
        _ => 0.0,
    };

    AttendanceRecord {
        status,
        checked_in_at,
        checked_out_at,
        hours,
        ..base
    }
}

/// Hours between the effective start and the check-out instant, never
/// negative, rounded to two decimals.
fn credited_hours(
    checked_in_at: DateTime<Utc>,
    checked_out_at: DateTime<Utc>,
    scheduled_start: DateTime<Utc>,
) -> f64 {
    let effective_start = checked_in_at.max(scheduled_start);
    let seconds = (checked_out_at - effective_start).num_seconds();
    #[expect(clippy::cast_precision_loss, reason = "durations are far below 2^52 seconds")]
    let hours = (seconds.max(0) as f64) / 3600.0;
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrganizationId, TeamId};
    use chrono::NaiveDate;

    fn occurrence() -> Occurrence {
        Occurrence::one_off(
            OrganizationId::new("org-1").unwrap(),
            Some(TeamId::new("team-1").unwrap()),
            "Evening practice",
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            "6:00 PM".parse().unwrap(),
            "8:00 PM".parse().unwrap(),
        )
    }

    fn participant() -> ParticipantId {
        ParticipantId::new("athlete-1").unwrap()
    }

    fn instant(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid test instant")
            .with_timezone(&Utc)
    }

    #[test]
    fn early_check_in_is_on_time() {
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T17:55:00Z"));
        assert_eq!(record.status, AttendanceStatus::OnTime);
        assert!(record.checked_in_at.is_some());
        assert!(record.checked_out_at.is_none());
    }

    #[test]
    fn exact_start_is_on_time() {
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T18:00:00Z"));
        assert_eq!(record.status, AttendanceStatus::OnTime);
    }

    #[test]
    fn one_minute_past_start_is_late() {
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T18:01:00Z"));
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[test]
    fn check_out_clamps_early_arrival_to_scheduled_start() {
        // In at 5:30 PM, start 6:00 PM, out at 8:10 PM: credit is 2.17, not 2.67.
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T17:30:00Z"));
        let record = check_out(record, &occurrence(), instant("2025-03-10T20:10:00Z")).unwrap();
        assert!((record.hours - 2.17).abs() < f64::EPSILON);
        assert_eq!(record.status, AttendanceStatus::OnTime);
    }

    #[test]
    fn check_out_after_late_arrival_counts_from_arrival() {
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T18:30:00Z"));
        let record = check_out(record, &occurrence(), instant("2025-03-10T20:00:00Z")).unwrap();
        assert!((record.hours - 1.5).abs() < f64::EPSILON);
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[test]
    fn check_out_before_effective_start_credits_zero() {
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T17:30:00Z"));
        let record = check_out(record, &occurrence(), instant("2025-03-10T17:45:00Z")).unwrap();
        assert!(record.hours.abs() < f64::EPSILON);
    }

    #[test]
    fn check_out_requires_check_in() {
        let record = apply_mark(
            None,
            &occurrence(),
            participant(),
            AttendanceStatus::OnTime,
            TimestampPatch::Clear,
            TimestampPatch::Clear,
            instant("2025-03-10T18:00:00Z"),
        );
        let err = check_out(record, &occurrence(), instant("2025-03-10T20:00:00Z")).unwrap_err();
        assert!(matches!(err, CheckinError::NotCheckedIn { .. }));
    }

    #[test]
    fn double_check_out_is_rejected() {
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T18:00:00Z"));
        let record = check_out(record, &occurrence(), instant("2025-03-10T20:00:00Z")).unwrap();
        let err = check_out(record, &occurrence(), instant("2025-03-10T20:30:00Z")).unwrap_err();
        assert!(matches!(err, CheckinError::AlreadyCheckedOut { .. }));
    }

    #[test]
    fn marking_absent_nulls_timestamps_and_zeroes_hours() {
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T18:00:00Z"));
        let record = check_out(record, &occurrence(), instant("2025-03-10T20:00:00Z")).unwrap();
        assert!(record.hours > 0.0);

        let marked = apply_mark(
            Some(record),
            &occurrence(),
            participant(),
            AttendanceStatus::Absent,
            TimestampPatch::Set(instant("2025-03-10T18:00:00Z")),
            TimestampPatch::Set(instant("2025-03-10T20:00:00Z")),
            instant("2025-03-10T21:00:00Z"),
        );
        assert_eq!(marked.status, AttendanceStatus::Absent);
        assert!(marked.checked_in_at.is_none());
        assert!(marked.checked_out_at.is_none());
        assert!(marked.hours.abs() < f64::EPSILON);
    }

    #[test]
    fn marking_excused_behaves_like_absent() {
        let marked = apply_mark(
            None,
            &occurrence(),
            participant(),
            AttendanceStatus::Excused,
            TimestampPatch::Default,
            TimestampPatch::Default,
            instant("2025-03-10T21:00:00Z"),
        );
        assert_eq!(marked.status, AttendanceStatus::Excused);
        assert!(marked.checked_in_at.is_none());
        assert!(marked.checked_out_at.is_none());
        assert!(marked.hours.abs() < f64::EPSILON);
    }

    #[test]
    fn mark_defaults_timestamps_to_now() {
        let now = instant("2025-03-10T19:00:00Z");
        let marked = apply_mark(
            None,
            &occurrence(),
            participant(),
            AttendanceStatus::Late,
            TimestampPatch::Default,
            TimestampPatch::Default,
            now,
        );
        assert_eq!(marked.checked_in_at, Some(now));
        assert_eq!(marked.checked_out_at, Some(now));
        // Both at 7 PM, effective start 6 PM: one hour credited.
        assert!((marked.hours - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mark_distinguishes_clear_from_default() {
        let marked = apply_mark(
            None,
            &occurrence(),
            participant(),
            AttendanceStatus::OnTime,
            TimestampPatch::Set(instant("2025-03-10T17:50:00Z")),
            TimestampPatch::Clear,
            instant("2025-03-10T21:00:00Z"),
        );
        assert_eq!(marked.checked_in_at, Some(instant("2025-03-10T17:50:00Z")));
        assert!(marked.checked_out_at.is_none());
        assert!(marked.hours.abs() < f64::EPSILON);
    }

    #[test]
    fn mark_recomputes_hours_with_effective_start_clamp() {
        let marked = apply_mark(
            None,
            &occurrence(),
            participant(),
            AttendanceStatus::OnTime,
            TimestampPatch::Set(instant("2025-03-10T17:00:00Z")),
            TimestampPatch::Set(instant("2025-03-10T20:30:00Z")),
            instant("2025-03-10T23:00:00Z"),
        );
        // Effective start clamps 5:00 PM forward to 6:00 PM.
        assert!((marked.hours - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn correction_is_re_entrant_from_absent() {
        let absent = apply_mark(
            None,
            &occurrence(),
            participant(),
            AttendanceStatus::Absent,
            TimestampPatch::Default,
            TimestampPatch::Default,
            instant("2025-03-10T21:00:00Z"),
        );
        let corrected = apply_mark(
            Some(absent),
            &occurrence(),
            participant(),
            AttendanceStatus::Late,
            TimestampPatch::Set(instant("2025-03-10T18:30:00Z")),
            TimestampPatch::Set(instant("2025-03-10T20:00:00Z")),
            instant("2025-03-10T21:00:00Z"),
        );
        assert_eq!(corrected.status, AttendanceStatus::Late);
        assert!((corrected.hours - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn mark_preserves_note_and_flags() {
        let mut record = check_in(&occurrence(), participant(), instant("2025-03-10T18:00:00Z"));
        record.note = Some("left early".to_string());
        let marked = apply_mark(
            Some(record),
            &occurrence(),
            participant(),
            AttendanceStatus::Late,
            TimestampPatch::Default,
            TimestampPatch::Clear,
            instant("2025-03-10T19:00:00Z"),
        );
        assert_eq!(marked.note.as_deref(), Some("left early"));
        assert!(marked.approved);
    }

    #[test]
    fn hours_round_to_two_decimals() {
        // 100 minutes = 1.666.. hours -> 1.67.
        let record = check_in(&occurrence(), participant(), instant("2025-03-10T18:00:00Z"));
        let record = check_out(record, &occurrence(), instant("2025-03-10T19:40:00Z")).unwrap();
        assert!((record.hours - 1.67).abs() < f64::EPSILON);
    }
}
