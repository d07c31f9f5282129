//! Roster command: the attendance report for one occurrence.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use rollcall_core::types::OccurrenceId;

use super::util;
use crate::Config;

#[derive(Debug, Args)]
pub struct RosterArgs {
    /// Occurrence to report on.
    pub occurrence: String,
    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &RosterArgs, config: &Config) -> Result<()> {
    let occurrence_id = OccurrenceId::new(&args.occurrence)?;

    let db = util::open_database(config)?;
    let occurrence = db.occurrence(&occurrence_id)?;
    let records = db.roster(&occurrence_id)?;

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &records)?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(writer, "{} on {}", occurrence.title, occurrence.date)?;
    if records.is_empty() {
        writeln!(writer, "  (no attendance recorded)")?;
        return Ok(());
    }
    for record in &records {
        let pending = if record.approved { "" } else { "  [pending approval]" };
        writeln!(
            writer,
            "  {}  {}  {:.2}h{}",
            record.participant_id, record.status, record.hours, pending
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use rollcall_core::types::{OrganizationId, ParticipantId, TeamId};
    use rollcall_core::{Occurrence, checkin};
    use rollcall_db::Database;

    fn test_config() -> (tempfile::TempDir, Config) {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("rollcall.db"),
            early_window_minutes: 30,
            max_occurrences: 365,
        };
        (temp, config)
    }

    fn seed(config: &Config) -> Occurrence {
        let db = Database::open(&config.database_path).unwrap();
        let occurrence = Occurrence::one_off(
            OrganizationId::new("org-1").unwrap(),
            Some(TeamId::new("team-1").unwrap()),
            "Evening practice",
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            "6:00 PM".parse().unwrap(),
            "8:00 PM".parse().unwrap(),
        );
        db.insert_occurrence(&occurrence).unwrap();

        for (name, checked_in, checked_out) in [
            ("athlete-1", "2025-03-10T17:55:00Z", "2025-03-10T20:00:00Z"),
            ("athlete-2", "2025-03-10T18:20:00Z", "2025-03-10T20:00:00Z"),
        ] {
            let participant = ParticipantId::new(name).unwrap();
            let record =
                checkin::check_in(&occurrence, participant, checked_in.parse().unwrap());
            let record =
                checkin::check_out(record, &occurrence, checked_out.parse().unwrap()).unwrap();
            db.upsert_attendance(&record).unwrap();
        }
        occurrence
    }

    #[test]
    fn roster_lists_participants_with_hours() {
        let (_temp, config) = test_config();
        let occurrence = seed(&config);

        let mut output = Vec::new();
        let args = RosterArgs {
            occurrence: occurrence.id.as_str().to_string(),
            json: false,
        };
        run(&mut output, &args, &config).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Evening practice on 2025-03-10
          athlete-1  on_time  2.00h
          athlete-2  late  1.67h
        ");
    }

    #[test]
    fn empty_roster_says_so() {
        let (_temp, config) = test_config();
        let db = Database::open(&config.database_path).unwrap();
        let occurrence = Occurrence::one_off(
            OrganizationId::new("org-1").unwrap(),
            None,
            "All-hands meet",
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            "9:00 AM".parse().unwrap(),
            "10:00 AM".parse().unwrap(),
        );
        db.insert_occurrence(&occurrence).unwrap();
        drop(db);

        let mut output = Vec::new();
        let args = RosterArgs {
            occurrence: occurrence.id.as_str().to_string(),
            json: false,
        };
        run(&mut output, &args, &config).unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("(no attendance recorded)"));
    }

    #[test]
    fn roster_json_round_trips_records() {
        let (_temp, config) = test_config();
        let occurrence = seed(&config);

        let mut output = Vec::new();
        let args = RosterArgs {
            occurrence: occurrence.id.as_str().to_string(),
            json: true,
        };
        run(&mut output, &args, &config).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["participant_id"], "athlete-1");
        assert_eq!(parsed[0]["status"], "on_time");
    }
}
