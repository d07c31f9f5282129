//! Scheduled occurrences and the templates that produce them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recurrence::RecurrenceRule;
use crate::timeofday::TimeOfDay;
use crate::types::{OccurrenceId, OrganizationId, TeamId, TemplateId};

/// A recurrence template: the rule plus the scheduling context shared by
/// every occurrence it expands into. Immutable once expanded - edits create
/// a new template and a new expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: TemplateId,
    pub organization_id: OrganizationId,
    pub team_id: Option<TeamId>,
    pub title: String,
    pub rule: RecurrenceRule,
    pub starts_at: TimeOfDay,
    pub ends_at: TimeOfDay,
}

impl Template {
    /// Creates a template with a fresh ID.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        team_id: Option<TeamId>,
        title: impl Into<String>,
        rule: RecurrenceRule,
        starts_at: TimeOfDay,
        ends_at: TimeOfDay,
    ) -> Self {
        Self {
            id: fresh_id(),
            organization_id,
            team_id,
            title: title.into(),
            rule,
            starts_at,
            ends_at,
        }
    }

    /// Materializes the occurrence for one expanded date.
    #[must_use]
    pub fn occurrence_on(&self, date: NaiveDate) -> Occurrence {
        Occurrence {
            id: fresh_id(),
            template_id: Some(self.id.clone()),
            organization_id: self.organization_id.clone(),
            team_id: self.team_id.clone(),
            title: self.title.clone(),
            date,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            ad_hoc: false,
        }
    }
}

/// One concrete scheduled instance of an activity on a specific date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: OccurrenceId,
    /// Back-reference to the owning template; cleared when a template is
    /// deleted in future-only mode.
    pub template_id: Option<TemplateId>,
    pub organization_id: OrganizationId,
    /// Team scope; `None` means visible organization-wide.
    pub team_id: Option<TeamId>,
    pub title: String,
    pub date: NaiveDate,
    pub starts_at: TimeOfDay,
    pub ends_at: TimeOfDay,
    pub ad_hoc: bool,
}

impl Occurrence {
    /// Creates a one-off scheduled occurrence with a fresh ID.
    #[must_use]
    pub fn one_off(
        organization_id: OrganizationId,
        team_id: Option<TeamId>,
        title: impl Into<String>,
        date: NaiveDate,
        starts_at: TimeOfDay,
        ends_at: TimeOfDay,
    ) -> Self {
        Self {
            id: fresh_id(),
            template_id: None,
            organization_id,
            team_id,
            title: title.into(),
            date,
            starts_at,
            ends_at,
            ad_hoc: false,
        }
    }

    /// Synthesizes a same-day occurrence for impromptu attendance.
    #[must_use]
    pub fn ad_hoc(
        organization_id: OrganizationId,
        team_id: TeamId,
        title: impl Into<String>,
        date: NaiveDate,
        starts_at: TimeOfDay,
        ends_at: TimeOfDay,
    ) -> Self {
        Self {
            id: fresh_id(),
            template_id: None,
            organization_id,
            team_id: Some(team_id),
            title: title.into(),
            date,
            starts_at,
            ends_at,
            ad_hoc: true,
        }
    }

    /// The scheduled start as a UTC instant.
    #[must_use]
    pub fn scheduled_start(&self) -> DateTime<Utc> {
        self.starts_at.on(self.date)
    }

    /// The scheduled end as a UTC instant.
    #[must_use]
    pub fn scheduled_end(&self) -> DateTime<Utc> {
        self.ends_at.on(self.date)
    }
}

/// Generates a fresh UUID-backed ID of any validated ID type.
fn fresh_id<T: TryFrom<String>>() -> T
where
    T::Error: std::fmt::Debug,
{
    // A v4 UUID string is never empty, so validation cannot fail.
    T::try_from(Uuid::new_v4().to_string()).expect("uuid is a valid ID")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::Frequency;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn template() -> Template {
        Template::new(
            OrganizationId::new("org-1").unwrap(),
            Some(TeamId::new("team-1").unwrap()),
            "Evening practice",
            RecurrenceRule {
                start_date: date(2025, 3, 1),
                end_date: date(2025, 3, 31),
                frequency: Frequency::Daily,
                weekdays: Vec::new(),
            },
            "6:00 PM".parse().unwrap(),
            "8:00 PM".parse().unwrap(),
        )
    }

    #[test]
    fn occurrence_inherits_template_context() {
        let template = template();
        let occurrence = template.occurrence_on(date(2025, 3, 5));

        assert_eq!(occurrence.template_id.as_ref(), Some(&template.id));
        assert_eq!(occurrence.organization_id, template.organization_id);
        assert_eq!(occurrence.team_id, template.team_id);
        assert_eq!(occurrence.title, "Evening practice");
        assert!(!occurrence.ad_hoc);
    }

    #[test]
    fn occurrences_get_distinct_ids() {
        let template = template();
        let a = template.occurrence_on(date(2025, 3, 5));
        let b = template.occurrence_on(date(2025, 3, 6));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn scheduled_instants_pin_time_to_date() {
        let occurrence = template().occurrence_on(date(2025, 3, 5));
        assert_eq!(
            occurrence.scheduled_start().to_rfc3339(),
            "2025-03-05T18:00:00+00:00"
        );
        assert_eq!(
            occurrence.scheduled_end().to_rfc3339(),
            "2025-03-05T20:00:00+00:00"
        );
    }

    #[test]
    fn ad_hoc_occurrence_is_flagged_and_team_scoped() {
        let occurrence = Occurrence::ad_hoc(
            OrganizationId::new("org-1").unwrap(),
            TeamId::new("team-1").unwrap(),
            "Extra conditioning",
            date(2025, 3, 5),
            "7:00 AM".parse().unwrap(),
            "8:00 AM".parse().unwrap(),
        );
        assert!(occurrence.ad_hoc);
        assert!(occurrence.template_id.is_none());
        assert!(occurrence.team_id.is_some());
    }
}
