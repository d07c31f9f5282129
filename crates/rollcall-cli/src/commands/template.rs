//! Template commands: define a recurrence and expand it, or delete one.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use rollcall_core::recurrence::Frequency;
use rollcall_core::timeofday::TimeOfDay;
use rollcall_core::types::{OrganizationId, TeamId, TemplateId};
use rollcall_core::{RecurrenceRule, Template};

use super::util;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum TemplateAction {
    /// Create a template and materialize its occurrences.
    Create(CreateArgs),
    /// Delete a template and its occurrences.
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Owning organization.
    #[arg(long)]
    pub org: String,
    /// Team scope; omit for an organization-wide template.
    #[arg(long)]
    pub team: Option<String>,
    /// Activity title shown on every occurrence.
    #[arg(long)]
    pub title: String,
    /// First date of the range (YYYY-MM-DD).
    #[arg(long)]
    pub start_date: NaiveDate,
    /// Last date of the range, inclusive.
    #[arg(long)]
    pub end_date: NaiveDate,
    /// daily, weekly, biweekly, or monthly.
    #[arg(long)]
    pub frequency: Frequency,
    /// Weekday selection for weekly/biweekly rules; repeatable.
    #[arg(long = "weekday")]
    pub weekdays: Vec<String>,
    /// Start time, e.g. "6:00 PM" or "18:00".
    #[arg(long)]
    pub starts_at: TimeOfDay,
    /// End time.
    #[arg(long)]
    pub ends_at: TimeOfDay,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Template ID to delete.
    pub template_id: String,
    /// Preserve occurrences before today, detached from the template.
    #[arg(long)]
    pub future_only: bool,
    /// Override the deletion cutoff date (defaults to today).
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn create<W: Write>(writer: &mut W, args: &CreateArgs, config: &Config) -> Result<()> {
    let rule = RecurrenceRule {
        start_date: args.start_date,
        end_date: args.end_date,
        frequency: args.frequency,
        weekdays: util::parse_weekdays(&args.weekdays)?,
    };
    let dates = rule.expand(&config.expander_config())?;

    let template = Template::new(
        OrganizationId::new(&args.org)?,
        args.team.as_deref().map(TeamId::new).transpose()?,
        &args.title,
        rule,
        args.starts_at,
        args.ends_at,
    );

    let mut db = util::open_database(config)?;
    let occurrences = db.create_template(&template, &dates)?;

    writeln!(
        writer,
        "Created template {} ({} occurrences)",
        template.id,
        occurrences.len()
    )?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, args: &DeleteArgs, config: &Config) -> Result<()> {
    let id = TemplateId::new(&args.template_id)?;
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    let mut db = util::open_database(config)?;
    let removal = db.delete_template(&id, args.future_only, today)?;

    if args.future_only {
        writeln!(
            writer,
            "Deleted {} occurrences, kept {} past occurrences",
            removal.deleted, removal.detached
        )?;
    } else {
        writeln!(writer, "Deleted {} occurrences", removal.deleted)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use rollcall_db::{Database, DbError};

    fn test_config() -> (tempfile::TempDir, Config) {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("rollcall.db"),
            early_window_minutes: 30,
            max_occurrences: 365,
        };
        (temp, config)
    }

    fn create_args() -> CreateArgs {
        CreateArgs {
            org: "org-1".to_string(),
            team: Some("team-1".to_string()),
            title: "Evening practice".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            frequency: Frequency::Weekly,
            weekdays: vec!["tue".to_string(), "thu".to_string()],
            starts_at: "6:00 PM".parse().unwrap(),
            ends_at: "8:00 PM".parse().unwrap(),
        }
    }

    #[test]
    fn create_expands_and_reports_count() {
        let (_temp, config) = test_config();
        let mut output = Vec::new();

        create(&mut output, &create_args(), &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        // Tue/Thu from Mar 4 through Mar 31, 2025: eight occurrences.
        assert!(output.contains("(8 occurrences)"), "got: {output}");
    }

    #[test]
    fn create_rejects_weekly_without_weekdays() {
        let (_temp, config) = test_config();
        let mut output = Vec::new();
        let mut args = create_args();
        args.weekdays.clear();

        let err = create(&mut output, &args, &config).unwrap_err();
        assert!(err.to_string().contains("at least one weekday"));
    }

    #[test]
    fn create_rejects_unknown_weekday() {
        let (_temp, config) = test_config();
        let mut output = Vec::new();
        let mut args = create_args();
        args.weekdays = vec!["someday".to_string()];

        let err = create(&mut output, &args, &config).unwrap_err();
        assert!(err.to_string().contains("unknown weekday"));
    }

    #[test]
    fn delete_future_only_reports_both_counts() {
        let (_temp, config) = test_config();
        let mut output = Vec::new();
        let mut args = create_args();
        args.frequency = Frequency::Daily;
        args.weekdays.clear();
        args.start_date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        args.end_date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        create(&mut output, &args, &config).unwrap();

        let db = Database::open(&config.database_path).unwrap();
        let listed = db
            .occurrences_on(
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                &OrganizationId::new("org-1").unwrap(),
                &[TeamId::new("team-1").unwrap()],
            )
            .unwrap();
        let template_id = listed[0].template_id.clone().unwrap();
        drop(db);

        let mut output = Vec::new();
        let delete_args = DeleteArgs {
            template_id: template_id.as_str().to_string(),
            future_only: true,
            today: Some(NaiveDate::from_ymd_opt(2025, 3, 6).unwrap()),
        };
        delete(&mut output, &delete_args, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @"Deleted 5 occurrences, kept 5 past occurrences");
    }

    #[test]
    fn delete_missing_template_fails() {
        let (_temp, config) = test_config();
        let mut output = Vec::new();
        let args = DeleteArgs {
            template_id: "missing".to_string(),
            future_only: false,
            today: None,
        };

        let err = delete(&mut output, &args, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::NotFound { .. })
        ));
    }
}
