//! Ad-hoc attendance commands: register impromptu attendance and drive the
//! coach approval workflow.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use rollcall_core::timeofday::TimeOfDay;
use rollcall_core::types::{OccurrenceId, OrganizationId, ParticipantId, TeamId};
use rollcall_core::{Occurrence, checkin};

use super::util;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum AdhocAction {
    /// Register impromptu attendance, pending coach approval.
    Register(RegisterArgs),
    /// Approve a pending ad-hoc record.
    Approve(ReviewArgs),
    /// Deny a pending ad-hoc record, removing it and its occurrence.
    Deny(ReviewArgs),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Organization the attendance belongs to.
    #[arg(long)]
    pub org: String,
    /// Team the participant attended with.
    #[arg(long)]
    pub team: String,
    /// What the participant attended.
    #[arg(long)]
    pub title: String,
    /// Participant claiming attendance.
    #[arg(long)]
    pub participant: String,
    /// Start time of the activity.
    #[arg(long)]
    pub starts_at: TimeOfDay,
    /// End time of the activity.
    #[arg(long)]
    pub ends_at: TimeOfDay,
    /// Override the registration instant (RFC 3339; defaults to now).
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// Participant whose record is under review.
    pub participant: String,
    /// The synthetic occurrence ID from registration.
    pub occurrence: String,
}

pub fn register<W: Write>(writer: &mut W, args: &RegisterArgs, config: &Config) -> Result<()> {
    let organization = OrganizationId::new(&args.org)?;
    let participant = ParticipantId::new(&args.participant)?;
    let now = util::now_or(args.at);

    let db = util::open_database(config)?;
    db.require_org_member(&participant, &organization)?;

    let occurrence = Occurrence::ad_hoc(
        organization,
        TeamId::new(&args.team)?,
        &args.title,
        now.date_naive(),
        args.starts_at,
        args.ends_at,
    );
    db.insert_occurrence(&occurrence)?;

    let record = checkin::check_in(&occurrence, participant, now);
    db.upsert_attendance(&record)?;

    writeln!(
        writer,
        "Registered ad-hoc {} for {}, awaiting approval ({})",
        occurrence.title, record.participant_id, occurrence.id
    )?;
    Ok(())
}

pub fn approve<W: Write>(writer: &mut W, args: &ReviewArgs, config: &Config) -> Result<()> {
    let participant = ParticipantId::new(&args.participant)?;
    let occurrence = OccurrenceId::new(&args.occurrence)?;

    let db = util::open_database(config)?;
    db.approve_adhoc(&participant, &occurrence)?;

    writeln!(writer, "Approved ad-hoc attendance for {participant}")?;
    Ok(())
}

pub fn deny<W: Write>(writer: &mut W, args: &ReviewArgs, config: &Config) -> Result<()> {
    let participant = ParticipantId::new(&args.participant)?;
    let occurrence = OccurrenceId::new(&args.occurrence)?;

    let mut db = util::open_database(config)?;
    db.deny_adhoc(&participant, &occurrence)?;

    writeln!(writer, "Denied ad-hoc attendance for {participant}")?;
    Ok(())
}
