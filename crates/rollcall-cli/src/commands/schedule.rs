//! Schedule commands: one-off occurrences and daily listings.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use rollcall_core::Occurrence;
use rollcall_core::timeofday::TimeOfDay;
use rollcall_core::types::{OrganizationId, TeamId};

use super::util;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum ScheduleAction {
    /// Add a one-off occurrence outside any template.
    Add(AddArgs),
    /// List the occurrences on a date.
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Owning organization.
    #[arg(long)]
    pub org: String,
    /// Team scope; omit for an organization-wide occurrence.
    #[arg(long)]
    pub team: Option<String>,
    /// Activity title.
    #[arg(long)]
    pub title: String,
    /// Calendar date (YYYY-MM-DD).
    #[arg(long)]
    pub date: NaiveDate,
    /// Start time, e.g. "6:00 PM" or "18:00".
    #[arg(long)]
    pub starts_at: TimeOfDay,
    /// End time.
    #[arg(long)]
    pub ends_at: TimeOfDay,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Organization to list for.
    #[arg(long)]
    pub org: String,
    /// Team scopes to include; repeatable. Org-wide rows always appear.
    #[arg(long = "team")]
    pub teams: Vec<String>,
    /// Date to list (defaults to today).
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn add<W: Write>(writer: &mut W, args: &AddArgs, config: &Config) -> Result<()> {
    let occurrence = Occurrence::one_off(
        OrganizationId::new(&args.org)?,
        args.team.as_deref().map(TeamId::new).transpose()?,
        &args.title,
        args.date,
        args.starts_at,
        args.ends_at,
    );

    let db = util::open_database(config)?;
    db.insert_occurrence(&occurrence)?;

    writeln!(
        writer,
        "Scheduled {} on {} ({})",
        occurrence.title, occurrence.date, occurrence.id
    )?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, args: &ListArgs, config: &Config) -> Result<()> {
    let organization = OrganizationId::new(&args.org)?;
    let teams = args
        .teams
        .iter()
        .map(TeamId::new)
        .collect::<Result<Vec<_>, _>>()?;
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());

    let db = util::open_database(config)?;
    let occurrences = db.occurrences_on(date, &organization, &teams)?;

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &occurrences)?;
        writeln!(writer)?;
        return Ok(());
    }

    if occurrences.is_empty() {
        writeln!(writer, "No occurrences on {date}")?;
        return Ok(());
    }
    for occurrence in &occurrences {
        let scope = occurrence
            .team_id
            .as_ref()
            .map_or("org-wide", TeamId::as_str);
        writeln!(
            writer,
            "{} - {}  {}  [{}]",
            occurrence.starts_at, occurrence.ends_at, occurrence.title, scope
        )?;
    }
    Ok(())
}
