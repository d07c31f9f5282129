//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid attendance status value.
    #[error("invalid attendance status: {value}")]
    InvalidStatus { value: String },

    /// Invalid scan action value.
    #[error("invalid scan action: {value}")]
    InvalidScanAction { value: String },
}

/// Attendance status of a participant at one occurrence.
///
/// This enum encodes the valid ledger states, preventing invalid string
/// values. `Absent` and `Excused` are timestamp-free states: the state
/// machine forces both timestamps to null and hours to zero for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Checked in at or before the scheduled start.
    OnTime,
    /// Checked in after the scheduled start.
    Late,
    /// Marked absent by an administrator.
    Absent,
    /// Absence excused through the approval workflow.
    Excused,
}

impl AttendanceStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnTime => "on_time",
            Self::Late => "late",
            Self::Absent => "absent",
            Self::Excused => "excused",
        }
    }

    /// Returns true for the timestamp-free terminal states.
    #[must_use]
    pub const fn is_non_attending(&self) -> bool {
        matches!(self, Self::Absent | Self::Excused)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_time" => Ok(Self::OnTime),
            "late" => Ok(Self::Late),
            "absent" => Ok(Self::Absent),
            "excused" => Ok(Self::Excused),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// What a tag scan did to the selected occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    CheckedIn,
    CheckedOut,
}

impl ScanAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CheckedIn => "checked_in",
            Self::CheckedOut => "checked_out",
        }
    }
}

impl fmt::Display for ScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checked_in" => Ok(Self::CheckedIn),
            "checked_out" => Ok(Self::CheckedOut),
            _ => Err(ValidationError::InvalidScanAction {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated organization identifier.
    OrganizationId, "organization ID"
);

define_string_id!(
    /// A validated team identifier.
    TeamId, "team ID"
);

define_string_id!(
    /// A validated participant identifier.
    ///
    /// Participants are the athletes/members whose attendance is tracked.
    ParticipantId, "participant ID"
);

define_string_id!(
    /// A validated occurrence identifier.
    ///
    /// Occurrence IDs must be non-empty strings. They should be unique within
    /// the system, though uniqueness is enforced at the database level.
    OccurrenceId, "occurrence ID"
);

define_string_id!(
    /// A validated recurrence template identifier.
    TemplateId, "template ID"
);

define_string_id!(
    /// A validated physical tag identifier.
    ///
    /// Tags are scan keys bound to one organization; they carry no attendance
    /// state of their own.
    TagId, "tag ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_id_rejects_empty() {
        assert!(OccurrenceId::new("").is_err());
        assert!(OccurrenceId::new("occ-1").is_ok());
    }

    #[test]
    fn participant_id_serde_roundtrip() {
        let id = ParticipantId::new("athlete-42").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"athlete-42\"");
        let parsed: ParticipantId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn participant_id_serde_rejects_empty() {
        let result: Result<ParticipantId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn tag_id_as_ref() {
        let id = TagId::new("tag-7").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "tag-7");
    }

    #[test]
    fn status_roundtrip_all_variants() {
        for status in [
            AttendanceStatus::OnTime,
            AttendanceStatus::Late,
            AttendanceStatus::Absent,
            AttendanceStatus::Excused,
        ] {
            let s = status.as_str();
            let parsed: AttendanceStatus = s.parse().unwrap();
            assert_eq!(parsed, status);
            assert_eq!(status.to_string(), s);
        }
    }

    #[test]
    fn status_serde_matches_as_str() {
        // Prevents inconsistency between JSON output and DB storage.
        for status in [
            AttendanceStatus::OnTime,
            AttendanceStatus::Late,
            AttendanceStatus::Absent,
            AttendanceStatus::Excused,
        ] {
            let serde_value = serde_json::to_value(status).unwrap();
            assert_eq!(serde_value.as_str().unwrap(), status.as_str());
        }
    }

    #[test]
    fn status_invalid_errors() {
        let result = "present".parse::<AttendanceStatus>();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid attendance status: present"
        );
    }

    #[test]
    fn non_attending_statuses() {
        assert!(AttendanceStatus::Absent.is_non_attending());
        assert!(AttendanceStatus::Excused.is_non_attending());
        assert!(!AttendanceStatus::OnTime.is_non_attending());
        assert!(!AttendanceStatus::Late.is_non_attending());
    }

    #[test]
    fn scan_action_roundtrip() {
        for action in [ScanAction::CheckedIn, ScanAction::CheckedOut] {
            let parsed: ScanAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, action);
        }
        assert!("toggled".parse::<ScanAction>().is_err());
    }
}
