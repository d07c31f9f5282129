//! Storage layer for the attendance tracker.
//!
//! Provides persistence for templates, occurrences, attendance records,
//! seasons, tags, and membership lookups using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. For multi-threaded access, either serialize access with a
//! `Mutex<Database>`, use a connection pool, or open separate instances.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 format (`2025-03-10T18:00:00Z`),
//! calendar dates as `YYYY-MM-DD`, and times of day as 24-hour `HH:MM`, so
//! lexicographic ordering matches chronological ordering for all three.
//!
//! The uniqueness invariant of the check-in state machine lives here: the
//! attendance table is keyed by (participant_id, occurrence_id) and every
//! write goes through an upsert, so concurrent duplicate check-ins converge
//! to a single row.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, params, params_from_iter};
use thiserror::Error;

use rollcall_core::checkin::AttendanceRecord;
use rollcall_core::occurrence::{Occurrence, Template};
use rollcall_core::recurrence::{Frequency, RecurrenceRule};
use rollcall_core::season::SeasonAssignment;
use rollcall_core::timeofday::TimeOfDay;
use rollcall_core::types::{
    AttendanceStatus, OccurrenceId, OrganizationId, ParticipantId, TagId, TeamId, TemplateId,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A participant acted outside an organization they belong to.
    #[error("participant {participant} is not a member of organization {organization}")]
    NotAMember {
        participant: String,
        organization: String,
    },

    /// Failed to parse a stored calendar date.
    #[error("invalid date in column {column}: {value}")]
    DateParse {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in column {column}: {value}")]
    TimestampParse {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A stored value failed domain validation (ID, status, frequency,
    /// time of day, weekday).
    #[error("invalid {column}: {message}")]
    InvalidField {
        column: &'static str,
        message: String,
    },
}

/// A physical scan tag bound to one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: TagId,
    pub organization_id: OrganizationId,
    pub active: bool,
}

/// An organization season definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonRecord {
    pub id: String,
    pub organization_id: OrganizationId,
    pub name: String,
    pub start_month: u32,
    pub end_month: u32,
}

/// Counts from a template deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateRemoval {
    /// Past occurrences detached from the template (future-only mode).
    pub detached: usize,
    /// Occurrences deleted, along with their attendance records.
    pub deleted: usize,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database. Useful for testing.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS templates (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                team_id TEXT,
                title TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                frequency TEXT NOT NULL,
                weekdays TEXT NOT NULL,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL
            );

            -- Occurrences: date as YYYY-MM-DD, times as 24-hour HH:MM.
            -- template_id clears (not cascades) so future-only template
            -- deletion can preserve history.
            CREATE TABLE IF NOT EXISTS occurrences (
                id TEXT PRIMARY KEY,
                template_id TEXT,
                org_id TEXT NOT NULL,
                team_id TEXT,
                title TEXT NOT NULL,
                date TEXT NOT NULL,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL,
                ad_hoc INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (template_id) REFERENCES templates(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_occurrences_date ON occurrences(date);
            CREATE INDEX IF NOT EXISTS idx_occurrences_template ON occurrences(template_id);
            CREATE INDEX IF NOT EXISTS idx_occurrences_team ON occurrences(team_id);

            -- One row per (participant, occurrence): the state machine's
            -- uniqueness invariant.
            CREATE TABLE IF NOT EXISTS attendance (
                participant_id TEXT NOT NULL,
                occurrence_id TEXT NOT NULL,
                status TEXT NOT NULL,
                checked_in_at TEXT,
                checked_out_at TEXT,
                hours REAL NOT NULL DEFAULT 0,
                note TEXT,
                ad_hoc INTEGER NOT NULL DEFAULT 0,
                approved INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (participant_id, occurrence_id),
                FOREIGN KEY (occurrence_id) REFERENCES occurrences(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_attendance_occurrence ON attendance(occurrence_id);

            CREATE TABLE IF NOT EXISTS seasons (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                name TEXT NOT NULL,
                start_month INTEGER NOT NULL,
                end_month INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_seasons (
                team_id TEXT PRIMARY KEY,
                season_id TEXT NOT NULL,
                season_year INTEGER NOT NULL,
                FOREIGN KEY (season_id) REFERENCES seasons(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS org_members (
                participant_id TEXT NOT NULL,
                org_id TEXT NOT NULL,
                PRIMARY KEY (participant_id, org_id)
            );

            CREATE TABLE IF NOT EXISTS team_members (
                participant_id TEXT NOT NULL,
                team_id TEXT NOT NULL,
                org_id TEXT NOT NULL,
                PRIMARY KEY (participant_id, team_id)
            );

            CREATE INDEX IF NOT EXISTS idx_team_members_org ON team_members(participant_id, org_id);

            CREATE TABLE IF NOT EXISTS guardians (
                guardian_id TEXT NOT NULL,
                ward_id TEXT NOT NULL,
                org_id TEXT NOT NULL,
                PRIMARY KEY (guardian_id, ward_id, org_id)
            );
            ",
        )?;
        Ok(())
    }

    // ----- templates and occurrences -----

    /// Inserts a template and all of its expanded occurrences atomically.
    ///
    /// A partially-applied expansion is never visible: either the template
    /// and every occurrence land, or nothing does.
    pub fn create_template(
        &mut self,
        template: &Template,
        dates: &[NaiveDate],
    ) -> Result<Vec<Occurrence>, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO templates
            (id, org_id, team_id, title, start_date, end_date, frequency, weekdays, starts_at, ends_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                template.id.as_str(),
                template.organization_id.as_str(),
                template.team_id.as_ref().map(TeamId::as_str),
                template.title,
                format_date(template.rule.start_date),
                format_date(template.rule.end_date),
                template.rule.frequency.as_str(),
                format_weekdays(&template.rule.weekdays),
                format_time(template.starts_at),
                format_time(template.ends_at),
            ],
        )?;

        let mut occurrences = Vec::with_capacity(dates.len());
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO occurrences
                (id, template_id, org_id, team_id, title, date, starts_at, ends_at, ad_hoc)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for date in dates {
                let occurrence = template.occurrence_on(*date);
                insert_occurrence_row(&mut stmt, &occurrence)?;
                occurrences.push(occurrence);
            }
        }
        tx.commit()?;
        tracing::debug!(
            template = %template.id,
            occurrences = occurrences.len(),
            "template expanded"
        );
        Ok(occurrences)
    }

    /// Loads a template by ID.
    pub fn template(&self, id: &TemplateId) -> Result<Template, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, org_id, team_id, title, start_date, end_date, frequency, weekdays, starts_at, ends_at
            FROM templates
            WHERE id = ?
            ",
        )?;
        let raw = stmt
            .query_row(params![id.as_str()], |row| {
                Ok(RawTemplate {
                    id: row.get(0)?,
                    org_id: row.get(1)?,
                    team_id: row.get(2)?,
                    title: row.get(3)?,
                    start_date: row.get(4)?,
                    end_date: row.get(5)?,
                    frequency: row.get(6)?,
                    weekdays: row.get(7)?,
                    starts_at: row.get(8)?,
                    ends_at: row.get(9)?,
                })
            })
            .map_err(|e| not_found(e, "template", id.as_str()))?;
        raw.into_template()
    }

    /// Deletes a template and its occurrences.
    ///
    /// In future-only mode, occurrences strictly before `today` are detached
    /// from the template (their back-reference cleared) so historical
    /// attendance survives; occurrences on or after `today` are deleted with
    /// their attendance records. Everything happens in one transaction.
    pub fn delete_template(
        &mut self,
        id: &TemplateId,
        future_only: bool,
        today: NaiveDate,
    ) -> Result<TemplateRemoval, DbError> {
        let tx = self.conn.transaction()?;
        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM templates WHERE id = ?",
                params![id.as_str()],
                |_| Ok(true),
            )
            .unwrap_or(false);
        if !exists {
            return Err(DbError::NotFound {
                entity: "template",
                id: id.as_str().to_string(),
            });
        }

        let detached = if future_only {
            tx.execute(
                "UPDATE occurrences SET template_id = NULL WHERE template_id = ? AND date < ?",
                params![id.as_str(), format_date(today)],
            )?
        } else {
            0
        };
        let deleted = tx.execute(
            "DELETE FROM occurrences WHERE template_id = ?",
            params![id.as_str()],
        )?;
        tx.execute("DELETE FROM templates WHERE id = ?", params![id.as_str()])?;
        tx.commit()?;
        tracing::debug!(template = %id, detached, deleted, "template removed");
        Ok(TemplateRemoval { detached, deleted })
    }

    /// Inserts a single occurrence (one-off or ad-hoc).
    pub fn insert_occurrence(&self, occurrence: &Occurrence) -> Result<(), DbError> {
        let mut stmt = self.conn.prepare(
            "
            INSERT INTO occurrences
            (id, template_id, org_id, team_id, title, date, starts_at, ends_at, ad_hoc)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )?;
        insert_occurrence_row(&mut stmt, occurrence)?;
        Ok(())
    }

    /// Loads an occurrence by ID.
    pub fn occurrence(&self, id: &OccurrenceId) -> Result<Occurrence, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, template_id, org_id, team_id, title, date, starts_at, ends_at, ad_hoc
            FROM occurrences
            WHERE id = ?
            ",
        )?;
        let raw = stmt
            .query_row(params![id.as_str()], raw_occurrence)
            .map_err(|e| not_found(e, "occurrence", id.as_str()))?;
        raw.into_occurrence()
    }

    /// Lists the occurrences on a date visible to the given teams: rows
    /// scoped to one of the teams plus organization-wide rows. Ordered by
    /// start time, then ID for a stable tiebreak.
    pub fn occurrences_on(
        &self,
        date: NaiveDate,
        organization: &OrganizationId,
        teams: &[TeamId],
    ) -> Result<Vec<Occurrence>, DbError> {
        let placeholders = vec!["?"; teams.len()].join(", ");
        let sql = format!(
            "
            SELECT id, template_id, org_id, team_id, title, date, starts_at, ends_at, ad_hoc
            FROM occurrences
            WHERE date = ? AND org_id = ? AND (team_id IS NULL OR team_id IN ({placeholders}))
            ORDER BY starts_at ASC, id ASC
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values = vec![format_date(date), organization.as_str().to_string()];
        values.extend(teams.iter().map(|t| t.as_str().to_string()));
        let rows = stmt.query_map(params_from_iter(values), raw_occurrence)?;

        let mut occurrences = Vec::new();
        for row in rows {
            occurrences.push(row?.into_occurrence()?);
        }
        Ok(occurrences)
    }

    // ----- attendance -----

    /// Writes an attendance record, keyed by (participant, occurrence).
    ///
    /// An existing row is overwritten in place, so duplicate concurrent
    /// check-ins converge to one record.
    pub fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO attendance
            (participant_id, occurrence_id, status, checked_in_at, checked_out_at, hours, note, ad_hoc, approved)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(participant_id, occurrence_id) DO UPDATE SET
                status = excluded.status,
                checked_in_at = excluded.checked_in_at,
                checked_out_at = excluded.checked_out_at,
                hours = excluded.hours,
                note = excluded.note,
                ad_hoc = excluded.ad_hoc,
                approved = excluded.approved
            ",
            params![
                record.participant_id.as_str(),
                record.occurrence_id.as_str(),
                record.status.as_str(),
                record.checked_in_at.map(format_timestamp),
                record.checked_out_at.map(format_timestamp),
                record.hours,
                record.note,
                i64::from(record.ad_hoc),
                i64::from(record.approved),
            ],
        )?;
        Ok(())
    }

    /// Loads one participant's record for one occurrence, if any.
    pub fn attendance(
        &self,
        participant: &ParticipantId,
        occurrence: &OccurrenceId,
    ) -> Result<Option<AttendanceRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT participant_id, occurrence_id, status, checked_in_at, checked_out_at, hours, note, ad_hoc, approved
            FROM attendance
            WHERE participant_id = ? AND occurrence_id = ?
            ",
        )?;
        let raw = stmt
            .query_row(
                params![participant.as_str(), occurrence.as_str()],
                raw_attendance,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        raw.map(RawAttendance::into_record).transpose()
    }

    /// Loads one participant's records for a set of occurrences.
    pub fn attendance_for(
        &self,
        participant: &ParticipantId,
        occurrences: &[OccurrenceId],
    ) -> Result<HashMap<OccurrenceId, AttendanceRecord>, DbError> {
        if occurrences.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; occurrences.len()].join(", ");
        let sql = format!(
            "
            SELECT participant_id, occurrence_id, status, checked_in_at, checked_out_at, hours, note, ad_hoc, approved
            FROM attendance
            WHERE participant_id = ? AND occurrence_id IN ({placeholders})
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values = vec![participant.as_str().to_string()];
        values.extend(occurrences.iter().map(|o| o.as_str().to_string()));
        let rows = stmt.query_map(params_from_iter(values), raw_attendance)?;

        let mut records = HashMap::new();
        for row in rows {
            let record = row?.into_record()?;
            records.insert(record.occurrence_id.clone(), record);
        }
        Ok(records)
    }

    /// Lists every record for an occurrence, ordered by participant.
    pub fn roster(&self, occurrence: &OccurrenceId) -> Result<Vec<AttendanceRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT participant_id, occurrence_id, status, checked_in_at, checked_out_at, hours, note, ad_hoc, approved
            FROM attendance
            WHERE occurrence_id = ?
            ORDER BY participant_id ASC
            ",
        )?;
        let rows = stmt.query_map(params![occurrence.as_str()], raw_attendance)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    /// Approves a pending ad-hoc record.
    pub fn approve_adhoc(
        &self,
        participant: &ParticipantId,
        occurrence: &OccurrenceId,
    ) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "
            UPDATE attendance SET approved = 1
            WHERE participant_id = ? AND occurrence_id = ? AND ad_hoc = 1
            ",
            params![participant.as_str(), occurrence.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound {
                entity: "pending ad-hoc attendance",
                id: occurrence.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Denies a pending ad-hoc record: deletes both the record and its
    /// synthetic occurrence, in one transaction.
    pub fn deny_adhoc(
        &mut self,
        participant: &ParticipantId,
        occurrence: &OccurrenceId,
    ) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute(
            "
            DELETE FROM attendance
            WHERE participant_id = ? AND occurrence_id = ? AND ad_hoc = 1
            ",
            params![participant.as_str(), occurrence.as_str()],
        )?;
        if deleted == 0 {
            return Err(DbError::NotFound {
                entity: "pending ad-hoc attendance",
                id: occurrence.as_str().to_string(),
            });
        }
        tx.execute(
            "DELETE FROM occurrences WHERE id = ? AND ad_hoc = 1",
            params![occurrence.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ----- tags -----

    /// Registers a scan tag.
    pub fn insert_tag(&self, tag: &TagRecord) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO tags (id, org_id, active) VALUES (?, ?, ?)",
            params![
                tag.id.as_str(),
                tag.organization_id.as_str(),
                i64::from(tag.active)
            ],
        )?;
        Ok(())
    }

    /// Loads a tag by ID.
    pub fn tag(&self, id: &TagId) -> Result<TagRecord, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, org_id, active FROM tags WHERE id = ?")?;
        let (raw_id, raw_org, active): (String, String, i64) = stmt
            .query_row(params![id.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e| not_found(e, "tag", id.as_str()))?;
        Ok(TagRecord {
            id: parse_field(raw_id, "tag id", TagId::new)?,
            organization_id: parse_field(raw_org, "org id", OrganizationId::new)?,
            active: active != 0,
        })
    }

    /// Activates or deactivates a tag.
    pub fn set_tag_active(&self, id: &TagId, active: bool) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE tags SET active = ? WHERE id = ?",
            params![i64::from(active), id.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound {
                entity: "tag",
                id: id.as_str().to_string(),
            });
        }
        Ok(())
    }

    // ----- memberships -----

    /// Adds a participant to an organization, ignoring duplicates.
    pub fn add_org_member(
        &self,
        participant: &ParticipantId,
        organization: &OrganizationId,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO org_members (participant_id, org_id) VALUES (?, ?)",
            params![participant.as_str(), organization.as_str()],
        )?;
        Ok(())
    }

    /// Whether a participant belongs to an organization.
    pub fn is_org_member(
        &self,
        participant: &ParticipantId,
        organization: &OrganizationId,
    ) -> Result<bool, DbError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM org_members WHERE participant_id = ? AND org_id = ?",
                params![participant.as_str(), organization.as_str()],
                |_| Ok(()),
            )
            .map(|()| true)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(false),
                other => Err(other),
            })?;
        Ok(found)
    }

    /// Errors unless the participant belongs to the organization.
    pub fn require_org_member(
        &self,
        participant: &ParticipantId,
        organization: &OrganizationId,
    ) -> Result<(), DbError> {
        if self.is_org_member(participant, organization)? {
            Ok(())
        } else {
            Err(DbError::NotAMember {
                participant: participant.as_str().to_string(),
                organization: organization.as_str().to_string(),
            })
        }
    }

    /// Adds a participant to a team within an organization.
    pub fn add_team_member(
        &self,
        participant: &ParticipantId,
        team: &TeamId,
        organization: &OrganizationId,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO team_members (participant_id, team_id, org_id) VALUES (?, ?, ?)",
            params![
                participant.as_str(),
                team.as_str(),
                organization.as_str()
            ],
        )?;
        Ok(())
    }

    /// The participant's team memberships within one organization.
    pub fn team_memberships(
        &self,
        participant: &ParticipantId,
        organization: &OrganizationId,
    ) -> Result<Vec<TeamId>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT team_id FROM team_members
            WHERE participant_id = ? AND org_id = ?
            ORDER BY team_id ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![participant.as_str(), organization.as_str()],
            |row| row.get::<_, String>(0),
        )?;
        let mut teams = Vec::new();
        for row in rows {
            teams.push(parse_field(row?, "team id", TeamId::new)?);
        }
        Ok(teams)
    }

    /// Records a guardianship relation within an organization.
    pub fn add_guardian(
        &self,
        guardian: &ParticipantId,
        ward: &ParticipantId,
        organization: &OrganizationId,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO guardians (guardian_id, ward_id, org_id) VALUES (?, ?, ?)",
            params![guardian.as_str(), ward.as_str(), organization.as_str()],
        )?;
        Ok(())
    }

    /// Whether `guardian` may act for `ward` within the organization.
    pub fn is_guardian(
        &self,
        guardian: &ParticipantId,
        ward: &ParticipantId,
        organization: &OrganizationId,
    ) -> Result<bool, DbError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM guardians WHERE guardian_id = ? AND ward_id = ? AND org_id = ?",
                params![guardian.as_str(), ward.as_str(), organization.as_str()],
                |_| Ok(()),
            )
            .map(|()| true)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(false),
                other => Err(other),
            })?;
        Ok(found)
    }

    // ----- seasons -----

    /// Defines a season for an organization.
    pub fn insert_season(&self, season: &SeasonRecord) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO seasons (id, org_id, name, start_month, end_month) VALUES (?, ?, ?, ?, ?)",
            params![
                season.id,
                season.organization_id.as_str(),
                season.name,
                season.start_month,
                season.end_month,
            ],
        )?;
        Ok(())
    }

    /// Assigns a season to a team for a reference year, replacing any
    /// previous assignment.
    pub fn assign_season(
        &self,
        team: &TeamId,
        season_id: &str,
        season_year: i32,
    ) -> Result<(), DbError> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM seasons WHERE id = ?",
                params![season_id],
                |_| Ok(true),
            )
            .unwrap_or(false);
        if !exists {
            return Err(DbError::NotFound {
                entity: "season",
                id: season_id.to_string(),
            });
        }
        self.conn.execute(
            "
            INSERT INTO team_seasons (team_id, season_id, season_year)
            VALUES (?, ?, ?)
            ON CONFLICT(team_id) DO UPDATE SET
                season_id = excluded.season_id,
                season_year = excluded.season_year
            ",
            params![team.as_str(), season_id, season_year],
        )?;
        Ok(())
    }

    /// The team's season assignment, if any. `None` means the team is
    /// treated as always active.
    pub fn season_assignment(&self, team: &TeamId) -> Result<Option<SeasonAssignment>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT s.start_month, s.end_month, ts.season_year
            FROM team_seasons ts
            JOIN seasons s ON s.id = ts.season_id
            WHERE ts.team_id = ?
            ",
        )?;
        let assignment = stmt
            .query_row(params![team.as_str()], |row| {
                Ok(SeasonAssignment {
                    start_month: row.get(0)?,
                    end_month: row.get(1)?,
                    season_year: row.get(2)?,
                })
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(assignment)
    }
}

// ----- row conversion -----

#[derive(Debug)]
struct RawTemplate {
    id: String,
    org_id: String,
    team_id: Option<String>,
    title: String,
    start_date: String,
    end_date: String,
    frequency: String,
    weekdays: String,
    starts_at: String,
    ends_at: String,
}

impl RawTemplate {
    fn into_template(self) -> Result<Template, DbError> {
        Ok(Template {
            id: parse_field(self.id, "template id", TemplateId::new)?,
            organization_id: parse_field(self.org_id, "org id", OrganizationId::new)?,
            team_id: self
                .team_id
                .map(|t| parse_field(t, "team id", TeamId::new))
                .transpose()?,
            title: self.title,
            rule: RecurrenceRule {
                start_date: parse_date(&self.start_date, "start_date")?,
                end_date: parse_date(&self.end_date, "end_date")?,
                frequency: parse_field(self.frequency, "frequency", |s: String| {
                    s.parse::<Frequency>()
                })?,
                weekdays: parse_weekdays(&self.weekdays)?,
            },
            starts_at: parse_time(&self.starts_at, "starts_at")?,
            ends_at: parse_time(&self.ends_at, "ends_at")?,
        })
    }
}

#[derive(Debug)]
struct RawOccurrence {
    id: String,
    template_id: Option<String>,
    org_id: String,
    team_id: Option<String>,
    title: String,
    date: String,
    starts_at: String,
    ends_at: String,
    ad_hoc: i64,
}

fn raw_occurrence(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawOccurrence> {
    Ok(RawOccurrence {
        id: row.get(0)?,
        template_id: row.get(1)?,
        org_id: row.get(2)?,
        team_id: row.get(3)?,
        title: row.get(4)?,
        date: row.get(5)?,
        starts_at: row.get(6)?,
        ends_at: row.get(7)?,
        ad_hoc: row.get(8)?,
    })
}

impl RawOccurrence {
    fn into_occurrence(self) -> Result<Occurrence, DbError> {
        Ok(Occurrence {
            id: parse_field(self.id, "occurrence id", OccurrenceId::new)?,
            template_id: self
                .template_id
                .map(|t| parse_field(t, "template id", TemplateId::new))
                .transpose()?,
            organization_id: parse_field(self.org_id, "org id", OrganizationId::new)?,
            team_id: self
                .team_id
                .map(|t| parse_field(t, "team id", TeamId::new))
                .transpose()?,
            title: self.title,
            date: parse_date(&self.date, "date")?,
            starts_at: parse_time(&self.starts_at, "starts_at")?,
            ends_at: parse_time(&self.ends_at, "ends_at")?,
            ad_hoc: self.ad_hoc != 0,
        })
    }
}

#[derive(Debug)]
struct RawAttendance {
    participant_id: String,
    occurrence_id: String,
    status: String,
    checked_in_at: Option<String>,
    checked_out_at: Option<String>,
    hours: f64,
    note: Option<String>,
    ad_hoc: i64,
    approved: i64,
}

fn raw_attendance(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAttendance> {
    Ok(RawAttendance {
        participant_id: row.get(0)?,
        occurrence_id: row.get(1)?,
        status: row.get(2)?,
        checked_in_at: row.get(3)?,
        checked_out_at: row.get(4)?,
        hours: row.get(5)?,
        note: row.get(6)?,
        ad_hoc: row.get(7)?,
        approved: row.get(8)?,
    })
}

impl RawAttendance {
    fn into_record(self) -> Result<AttendanceRecord, DbError> {
        Ok(AttendanceRecord {
            participant_id: parse_field(self.participant_id, "participant id", ParticipantId::new)?,
            occurrence_id: parse_field(self.occurrence_id, "occurrence id", OccurrenceId::new)?,
            status: parse_field(self.status, "status", |s: String| {
                s.parse::<AttendanceStatus>()
            })?,
            checked_in_at: self
                .checked_in_at
                .map(|t| parse_timestamp(&t, "checked_in_at"))
                .transpose()?,
            checked_out_at: self
                .checked_out_at
                .map(|t| parse_timestamp(&t, "checked_out_at"))
                .transpose()?,
            hours: self.hours,
            note: self.note,
            ad_hoc: self.ad_hoc != 0,
            approved: self.approved != 0,
        })
    }
}

fn insert_occurrence_row(
    stmt: &mut rusqlite::Statement<'_>,
    occurrence: &Occurrence,
) -> rusqlite::Result<usize> {
    stmt.execute(params![
        occurrence.id.as_str(),
        occurrence.template_id.as_ref().map(TemplateId::as_str),
        occurrence.organization_id.as_str(),
        occurrence.team_id.as_ref().map(TeamId::as_str),
        occurrence.title,
        format_date(occurrence.date),
        format_time(occurrence.starts_at),
        format_time(occurrence.ends_at),
        i64::from(occurrence.ad_hoc),
    ])
}

/// Maps a no-rows error to `NotFound`, passing other errors through.
fn not_found(error: rusqlite::Error, entity: &'static str, id: &str) -> DbError {
    match error {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound {
            entity,
            id: id.to_string(),
        },
        other => DbError::Sqlite(other),
    }
}

fn parse_field<T, E: std::fmt::Display>(
    value: String,
    column: &'static str,
    parse: impl FnOnce(String) -> Result<T, E>,
) -> Result<T, DbError> {
    parse(value).map_err(|e| DbError::InvalidField {
        column,
        message: e.to_string(),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(value: &str, column: &'static str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| DbError::DateParse {
        column,
        value: value.to_string(),
        source,
    })
}

/// 24-hour `HH:MM`, so lexicographic ordering is chronological.
fn format_time(time: TimeOfDay) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn parse_time(value: &str, column: &'static str) -> Result<TimeOfDay, DbError> {
    value.parse().map_err(|e: rollcall_core::TimeOfDayError| {
        DbError::InvalidField {
            column,
            message: e.to_string(),
        }
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(value: &str, column: &'static str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            column,
            value: value.to_string(),
            source,
        })
}

fn format_weekdays(weekdays: &[chrono::Weekday]) -> String {
    weekdays
        .iter()
        .map(|w| w.to_string().to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_weekdays(value: &str) -> Result<Vec<chrono::Weekday>, DbError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|part| {
            part.parse().map_err(|_| DbError::InvalidField {
                column: "weekdays",
                message: format!("unknown weekday: {part}"),
            })
        })
        .collect()
}
