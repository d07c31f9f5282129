//! Tag scan command: resolve a physical tag scan to a check-in or check-out.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;

use rollcall_core::types::{ParticipantId, ScanAction, TagId};
use rollcall_core::{ScanError, resolve_scan};

use super::util;
use crate::Config;

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Scanned tag ID.
    pub tag: String,
    /// Participant presenting the tag.
    pub participant: String,
    /// Act for a ward instead; requires a guardian relation in the tag's
    /// organization.
    #[arg(long = "for", value_name = "WARD")]
    pub ward: Option<String>,
    /// Override the scan instant (RFC 3339; defaults to now).
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

pub fn run<W: Write>(writer: &mut W, args: &ScanArgs, config: &Config) -> Result<()> {
    let db = util::open_database(config)?;

    let tag = db.tag(&TagId::new(&args.tag)?)?;
    if !tag.active {
        return Err(ScanError::InactiveTag { tag: tag.id }.into());
    }

    let scanner = ParticipantId::new(&args.participant)?;
    let participant = match &args.ward {
        Some(ward) => {
            let ward = ParticipantId::new(ward)?;
            if !db.is_guardian(&scanner, &ward, &tag.organization_id)? {
                bail!(
                    "{scanner} is not a guardian of {ward} in {}",
                    tag.organization_id
                );
            }
            ward
        }
        None => scanner,
    };
    db.require_org_member(&participant, &tag.organization_id)?;
    let teams = db.team_memberships(&participant, &tag.organization_id)?;

    let now = util::now_or(args.at);
    let occurrences = db.occurrences_on(now.date_naive(), &tag.organization_id, &teams)?;
    let ids: Vec<_> = occurrences.iter().map(|o| o.id.clone()).collect();
    let records = db.attendance_for(&participant, &ids)?;

    match resolve_scan(&occurrences, &records, &participant, now, &config.scan_config()) {
        Ok(outcome) => {
            db.upsert_attendance(&outcome.record)?;
            let title = occurrences
                .iter()
                .find(|o| o.id == outcome.occurrence_id)
                .map_or("activity", |o| o.title.as_str());
            match outcome.action {
                ScanAction::CheckedIn => writeln!(
                    writer,
                    "{} checked in to {} ({})",
                    participant, title, outcome.record.status
                )?,
                ScanAction::CheckedOut => writeln!(
                    writer,
                    "{} checked out of {}: {:.2} hours",
                    participant, title, outcome.record.hours
                )?,
            }
            Ok(())
        }
        // Too-early is an expected outcome, not a failure: print a wait
        // message and exit cleanly.
        Err(ScanError::TooEarly { title, starts_at }) => {
            writeln!(
                writer,
                "Too early: {} starts at {}",
                title,
                starts_at.format("%-I:%M %p")
            )?;
            Ok(())
        }
        Err(other) => Err(other.into()),
    }
}
