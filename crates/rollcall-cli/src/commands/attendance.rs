//! Manual attendance commands: check-in, check-out, and administrative marks.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;

use rollcall_core::checkin::{self, TimestampPatch};
use rollcall_core::types::{AttendanceStatus, OccurrenceId, ParticipantId};

use super::util;
use crate::Config;

#[derive(Debug, Args)]
pub struct CheckinArgs {
    /// Participant to check in.
    pub participant: String,
    /// Occurrence ID.
    pub occurrence: String,
    /// Override the check-in instant (RFC 3339; defaults to now).
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Participant to check out.
    pub participant: String,
    /// Occurrence ID.
    pub occurrence: String,
    /// Override the check-out instant (RFC 3339; defaults to now).
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct MarkArgs {
    /// Participant to mark.
    pub participant: String,
    /// Occurrence ID.
    pub occurrence: String,
    /// on_time, late, absent, or excused.
    #[arg(long)]
    pub status: AttendanceStatus,
    /// Set the check-in timestamp explicitly.
    #[arg(long)]
    pub checked_in: Option<DateTime<Utc>>,
    /// Clear the check-in timestamp instead of defaulting it.
    #[arg(long, conflicts_with = "checked_in")]
    pub clear_checked_in: bool,
    /// Set the check-out timestamp explicitly.
    #[arg(long)]
    pub checked_out: Option<DateTime<Utc>>,
    /// Clear the check-out timestamp instead of defaulting it.
    #[arg(long, conflicts_with = "checked_out")]
    pub clear_checked_out: bool,
    /// Attach a note to the record.
    #[arg(long)]
    pub note: Option<String>,
    /// Override "now" for defaulted timestamps.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

pub fn checkin<W: Write>(writer: &mut W, args: &CheckinArgs, config: &Config) -> Result<()> {
    let participant = ParticipantId::new(&args.participant)?;
    let occurrence_id = OccurrenceId::new(&args.occurrence)?;
    let now = util::now_or(args.at);

    let db = util::open_database(config)?;
    let occurrence = db.occurrence(&occurrence_id)?;
    let existing = db.attendance(&participant, &occurrence_id)?;
    if existing.is_some_and(|r| r.checked_in_at.is_some()) {
        bail!("{participant} is already checked in to {}", occurrence.title);
    }

    let record = checkin::check_in(&occurrence, participant, now);
    db.upsert_attendance(&record)?;

    writeln!(
        writer,
        "{} checked in to {} ({})",
        record.participant_id, occurrence.title, record.status
    )?;
    Ok(())
}

pub fn checkout<W: Write>(writer: &mut W, args: &CheckoutArgs, config: &Config) -> Result<()> {
    let participant = ParticipantId::new(&args.participant)?;
    let occurrence_id = OccurrenceId::new(&args.occurrence)?;
    let now = util::now_or(args.at);

    let db = util::open_database(config)?;
    let occurrence = db.occurrence(&occurrence_id)?;
    let Some(record) = db.attendance(&participant, &occurrence_id)? else {
        bail!("no check-in recorded for {participant} at {}", occurrence.title);
    };

    let record = checkin::check_out(record, &occurrence, now)?;
    db.upsert_attendance(&record)?;

    writeln!(
        writer,
        "{} checked out of {}: {:.2} hours",
        record.participant_id, occurrence.title, record.hours
    )?;
    Ok(())
}

pub fn mark<W: Write>(writer: &mut W, args: &MarkArgs, config: &Config) -> Result<()> {
    let participant = ParticipantId::new(&args.participant)?;
    let occurrence_id = OccurrenceId::new(&args.occurrence)?;
    let now = util::now_or(args.at);

    let db = util::open_database(config)?;
    let occurrence = db.occurrence(&occurrence_id)?;
    let existing = db.attendance(&participant, &occurrence_id)?;

    let mut record = checkin::apply_mark(
        existing,
        &occurrence,
        participant,
        args.status,
        patch(args.checked_in, args.clear_checked_in),
        patch(args.checked_out, args.clear_checked_out),
        now,
    );
    if let Some(note) = &args.note {
        record.note = Some(note.clone());
    }
    db.upsert_attendance(&record)?;

    writeln!(
        writer,
        "Marked {} {} for {}",
        record.participant_id, record.status, occurrence.title
    )?;
    Ok(())
}

/// Folds the flag pair into the three-way patch.
const fn patch(set: Option<DateTime<Utc>>, clear: bool) -> TimestampPatch {
    if clear {
        TimestampPatch::Clear
    } else {
        match set {
            Some(t) => TimestampPatch::Set(t),
            None => TimestampPatch::Default,
        }
    }
}
