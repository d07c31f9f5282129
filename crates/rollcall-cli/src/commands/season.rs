//! Season commands: define org seasons, assign them to teams, and report
//! whether a team is currently in season.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use rollcall_core::types::{OrganizationId, TeamId};
use rollcall_core::{SeasonWindow, is_currently_active};
use rollcall_db::SeasonRecord;

use super::util;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum SeasonAction {
    /// Define a season for an organization.
    Define(DefineArgs),
    /// Assign a season to a team for a reference year.
    Assign(AssignArgs),
    /// Report whether a team is currently in season.
    Status(StatusArgs),
}

#[derive(Debug, Args)]
pub struct DefineArgs {
    /// Season identifier.
    pub id: String,
    /// Owning organization.
    #[arg(long)]
    pub org: String,
    /// Display name, e.g. "Winter".
    #[arg(long)]
    pub name: String,
    /// First month of the season (1-12).
    #[arg(long)]
    pub start_month: u32,
    /// Last month of the season (1-12); may precede start_month to wrap the
    /// year boundary.
    #[arg(long)]
    pub end_month: u32,
}

#[derive(Debug, Args)]
pub struct AssignArgs {
    /// Team to assign.
    pub team: String,
    /// Season identifier.
    pub season: String,
    /// Calendar year containing the season's end month.
    #[arg(long)]
    pub year: i32,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Team to report on.
    pub team: String,
    /// Override today's date.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn define<W: Write>(writer: &mut W, args: &DefineArgs, config: &Config) -> Result<()> {
    // Validates the month bounds; the year is irrelevant here.
    SeasonWindow::resolve(args.start_month, args.end_month, 2000)?;

    let db = util::open_database(config)?;
    db.insert_season(&SeasonRecord {
        id: args.id.clone(),
        organization_id: OrganizationId::new(&args.org)?,
        name: args.name.clone(),
        start_month: args.start_month,
        end_month: args.end_month,
    })?;

    writeln!(
        writer,
        "Defined season {} (months {}-{})",
        args.name, args.start_month, args.end_month
    )?;
    Ok(())
}

pub fn assign<W: Write>(writer: &mut W, args: &AssignArgs, config: &Config) -> Result<()> {
    let team = TeamId::new(&args.team)?;

    let db = util::open_database(config)?;
    db.assign_season(&team, &args.season, args.year)?;

    writeln!(writer, "Assigned season {} to {} for {}", args.season, team, args.year)?;
    Ok(())
}

pub fn status<W: Write>(writer: &mut W, args: &StatusArgs, config: &Config) -> Result<()> {
    let team = TeamId::new(&args.team)?;
    let today = args.date.unwrap_or_else(|| Utc::now().date_naive());

    let db = util::open_database(config)?;
    let assignment = db.season_assignment(&team)?;
    let active = is_currently_active(assignment.as_ref(), today)?;

    match assignment {
        Some(assignment) => {
            let window = SeasonWindow::for_assignment(&assignment)?;
            let state = if active { "in season" } else { "out of season" };
            writeln!(
                writer,
                "{team} is {state} ({} to {})",
                window.start, window.end
            )?;
        }
        None => {
            writeln!(writer, "{team} has no season assignment (always active)")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use rollcall_core::SeasonError;

    fn test_config() -> (tempfile::TempDir, Config) {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("rollcall.db"),
            early_window_minutes: 30,
            max_occurrences: 365,
        };
        (temp, config)
    }

    fn define_winter(config: &Config) {
        let mut output = Vec::new();
        let args = DefineArgs {
            id: "winter".to_string(),
            org: "org-1".to_string(),
            name: "Winter".to_string(),
            start_month: 9,
            end_month: 6,
        };
        define(&mut output, &args, config).unwrap();
    }

    fn assign_winter(config: &Config, year: i32) {
        let mut output = Vec::new();
        let args = AssignArgs {
            team: "team-1".to_string(),
            season: "winter".to_string(),
            year,
        };
        assign(&mut output, &args, config).unwrap();
    }

    fn status_on(config: &Config, date: &str) -> String {
        let mut output = Vec::new();
        let args = StatusArgs {
            team: "team-1".to_string(),
            date: Some(date.parse().unwrap()),
        };
        status(&mut output, &args, config).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn define_rejects_invalid_months() {
        let (_temp, config) = test_config();
        let mut output = Vec::new();
        let args = DefineArgs {
            id: "bad".to_string(),
            org: "org-1".to_string(),
            name: "Bad".to_string(),
            start_month: 0,
            end_month: 6,
        };
        let err = define(&mut output, &args, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeasonError>(),
            Some(SeasonError::MonthOutOfRange { value: 0 })
        ));
    }

    #[test]
    fn wrapping_season_status_across_the_year() {
        let (_temp, config) = test_config();
        define_winter(&config);
        assign_winter(&config, 2026);

        assert_snapshot!(
            status_on(&config, "2025-10-01"),
            @"team-1 is in season (2025-09-01 to 2026-06-30)"
        );
        assert_snapshot!(
            status_on(&config, "2026-07-15"),
            @"team-1 is out of season (2025-09-01 to 2026-06-30)"
        );
    }

    #[test]
    fn unassigned_team_is_always_active() {
        let (_temp, config) = test_config();
        assert_snapshot!(
            status_on(&config, "2025-07-04"),
            @"team-1 has no season assignment (always active)"
        );
    }

    #[test]
    fn reassignment_moves_the_window() {
        let (_temp, config) = test_config();
        define_winter(&config);
        assign_winter(&config, 2026);
        assign_winter(&config, 2027);

        let printed = status_on(&config, "2026-10-01");
        assert!(printed.contains("2026-09-01 to 2027-06-30"), "got: {printed}");
    }
}
